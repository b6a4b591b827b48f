use proptest::prelude::*;
use strata_geom::{Aabb, Frustum, Vec3};

fn small_f32() -> impl Strategy<Value = f32> {
    -1_000.0f32..1_000.0
}

fn small_vec3() -> impl Strategy<Value = Vec3> {
    (small_f32(), small_f32(), small_f32()).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn arb_aabb() -> impl Strategy<Value = Aabb> {
    (small_vec3(), small_vec3()).prop_map(|(a, b)| Aabb::from_corners(a, b))
}

proptest! {
    #[test]
    fn from_corners_is_ordered(a in small_vec3(), b in small_vec3()) {
        let bb = Aabb::from_corners(a, b);
        prop_assert!(bb.min.x <= bb.max.x && bb.min.y <= bb.max.y && bb.min.z <= bb.max.z);
        prop_assert!(bb.contains_point(a));
        prop_assert!(bb.contains_point(b));
    }

    #[test]
    fn center_is_inside(bb in arb_aabb()) {
        prop_assert!(bb.contains_point(bb.center()));
    }

    #[test]
    fn union_contains_both(a in arb_aabb(), b in arb_aabb()) {
        let u = a.union(&b);
        prop_assert!(u.intersects(&a));
        prop_assert!(u.intersects(&b));
        prop_assert!(u.contains_point(a.min) && u.contains_point(b.max));
    }

    #[test]
    fn intersects_is_symmetric(a in arb_aabb(), b in arb_aabb()) {
        prop_assert_eq!(a.intersects(&b), b.intersects(&a));
    }

    #[test]
    fn translation_keeps_extent(bb in arb_aabb(), t in small_vec3()) {
        let moved = bb.translated(t);
        let e0 = bb.extent();
        let e1 = moved.extent();
        prop_assert!((e0.x - e1.x).abs() <= 1e-2);
        prop_assert!((e0.y - e1.y).abs() <= 1e-2);
        prop_assert!((e0.z - e1.z).abs() <= 1e-2);
    }

    // Growing a box never turns a frustum hit into a miss.
    #[test]
    fn frustum_test_is_monotonic(bb in arb_aabb(), grow in 0.0f32..50.0, yaw in 0.0f32..6.28) {
        let f = Frustum::perspective(
            Vec3::ZERO,
            Vec3::new(yaw.cos(), 0.0, yaw.sin()),
            Vec3::UP,
            70f32.to_radians(),
            16.0 / 9.0,
            0.1,
            500.0,
        );
        let bigger = Aabb::new(bb.min - Vec3::splat(grow), bb.max + Vec3::splat(grow));
        if f.contains_aabb(&bb) {
            prop_assert!(f.contains_aabb(&bigger));
        }
    }

    #[test]
    fn everything_contains_any_box(bb in arb_aabb()) {
        prop_assert!(Frustum::everything().contains_aabb(&bb));
    }
}
