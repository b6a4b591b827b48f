use std::collections::VecDeque;

use strata_world::SectionPosition;

use crate::item::WorkItem;

/// Orders work items by squared section distance to the camera.
///
/// Distances are cached on the items and tagged with a sort generation that
/// advances whenever the camera enters another section.
#[derive(Debug)]
pub struct QueueComparator {
    sort: u64,
    camera: SectionPosition,
}

impl Default for QueueComparator {
    fn default() -> Self {
        Self {
            sort: 1,
            camera: SectionPosition::default(),
        }
    }
}

impl QueueComparator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn camera(&self) -> SectionPosition {
        self.camera
    }

    /// Returns true if the camera section changed and cached distances went stale.
    pub fn update(&mut self, camera: SectionPosition) -> bool {
        if self.camera == camera {
            return false;
        }
        self.camera = camera;
        self.sort += 1;
        true
    }

    #[inline]
    pub fn distance(&self, item: &mut WorkItem) -> i64 {
        if item.sort != self.sort {
            item.distance = item.position.distance_sq(self.camera);
            item.sort = self.sort;
        }
        item.distance
    }

    /// Stable sort: equal distances keep their insertion order.
    pub fn sort(&self, items: &mut VecDeque<WorkItem>) {
        for item in items.iter_mut() {
            self.distance(item);
        }
        items.make_contiguous().sort_by_key(|i| i.distance);
    }
}
