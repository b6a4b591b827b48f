use std::collections::HashSet;

use proptest::prelude::*;
use strata_runtime::WorkItem;
use strata_runtime::queue::MeshingQueue;
use strata_world::SectionPosition;

fn arb_pos() -> impl Strategy<Value = SectionPosition> {
    (-6i32..=6, -3i32..=3, -6i32..=6).prop_map(|(x, y, z)| SectionPosition::new(x, y, z))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn each_position_is_waiting_at_most_once(positions in prop::collection::vec(arb_pos(), 0..80)) {
        let q = MeshingQueue::new();
        let mut unique = HashSet::new();
        for p in &positions {
            prop_assert_eq!(q.queue(WorkItem::new(*p)), unique.insert(*p));
        }
        prop_assert_eq!(q.len(), unique.len());
        let mut popped = HashSet::new();
        while let Some(item) = q.pop() {
            prop_assert!(popped.insert(item.position));
        }
        prop_assert_eq!(popped, unique);
    }

    #[test]
    fn sorted_queue_pops_nearest_first(
        positions in prop::collection::vec(arb_pos(), 1..60),
        camera in arb_pos(),
    ) {
        let q = MeshingQueue::new();
        q.set_camera(camera);
        for p in &positions {
            q.queue(WorkItem::new(*p));
        }
        q.sort_and_wake();
        let mut last = i64::MIN;
        while let Some(item) = q.pop() {
            let d = item.position.distance_sq(camera);
            prop_assert!(d >= last, "{:?} popped after a nearer one", item.position);
            last = d;
        }
    }

    #[test]
    fn moving_the_camera_resorts(
        positions in prop::collection::vec(arb_pos(), 1..60),
        first in arb_pos(),
        second in arb_pos(),
    ) {
        let q = MeshingQueue::new();
        q.set_camera(first);
        for p in &positions {
            q.queue(WorkItem::new(*p));
        }
        q.sort_and_wake();
        q.set_camera(second);
        let mut last = i64::MIN;
        while let Some(item) = q.pop() {
            let d = item.position.distance_sq(second);
            prop_assert!(d >= last);
            last = d;
        }
    }
}
