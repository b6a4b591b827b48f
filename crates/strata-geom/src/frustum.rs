use crate::{Aabb, Vec3};

/// Plane `normal . p + distance = 0`, normal pointing into the kept half-space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    /// Normalizes `(a, b, c, d)`; a zero normal yields a plane that keeps everything.
    pub fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        let normal = Vec3::new(a, b, c);
        let len = normal.length();
        if len > 0.0 {
            Self {
                normal: normal / len,
                distance: d / len,
            }
        } else {
            Self {
                normal: Vec3::ZERO,
                distance: 0.0,
            }
        }
    }

    /// Plane through `point` with the given inward normal.
    #[inline]
    pub fn through(point: Vec3, normal: Vec3) -> Self {
        let n = normal.normalized();
        Self {
            normal: n,
            distance: -n.dot(point),
        }
    }

    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.distance
    }
}

/// View frustum as six inward-facing planes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// A frustum that contains every box. Useful for headless drivers and tests.
    pub fn everything() -> Self {
        Self {
            planes: [Plane::new(0.0, 0.0, 0.0, 0.0); 6],
        }
    }

    /// Gribb-Hartmann extraction from a column-major view-projection matrix.
    pub fn from_view_projection(m: &[f32; 16]) -> Self {
        let row = |i: usize| [m[i], m[4 + i], m[8 + i], m[12 + i]];
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        let plane = |a: [f32; 4], b: [f32; 4], s: f32| {
            Plane::new(
                a[0] + s * b[0],
                a[1] + s * b[1],
                a[2] + s * b[2],
                a[3] + s * b[3],
            )
        };
        Self {
            planes: [
                plane(r3, r0, 1.0),
                plane(r3, r0, -1.0),
                plane(r3, r1, 1.0),
                plane(r3, r1, -1.0),
                plane(r3, r2, 1.0),
                plane(r3, r2, -1.0),
            ],
        }
    }

    /// Builds the planes of a symmetric perspective camera directly from its basis.
    /// `fov_y` is the full vertical field of view in radians.
    pub fn perspective(
        eye: Vec3,
        forward: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let f = forward.normalized();
        let r = f.cross(up).normalized();
        let u = r.cross(f);
        let half_v = fov_y * 0.5;
        let half_h = (half_v.tan() * aspect).atan();
        let (sv, cv) = half_v.sin_cos();
        let (sh, ch) = half_h.sin_cos();
        Self {
            planes: [
                Plane::through(eye, f * sh + r * ch),
                Plane::through(eye, f * sh - r * ch),
                Plane::through(eye, f * sv + u * cv),
                Plane::through(eye, f * sv - u * cv),
                Plane::through(eye + f * near, f),
                Plane::through(eye + f * far, -f),
            ],
        }
    }

    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.planes.iter().all(|pl| pl.signed_distance(p) >= 0.0)
    }

    /// Conservative box test: false only when the box is fully outside one plane.
    pub fn contains_aabb(&self, aabb: &Aabb) -> bool {
        for pl in &self.planes {
            let n = pl.normal;
            let p = Vec3::new(
                if n.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if n.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if n.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if pl.signed_distance(p) < 0.0 {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Frustum {
        Frustum::perspective(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::UP,
            60f32.to_radians(),
            1.0,
            0.1,
            100.0,
        )
    }

    #[test]
    fn everything_contains_far_boxes() {
        let f = Frustum::everything();
        let b = Aabb::new(Vec3::splat(1.0e6), Vec3::splat(1.0e6 + 16.0));
        assert!(f.contains_aabb(&b));
    }

    #[test]
    fn perspective_keeps_ahead_and_rejects_behind() {
        let f = camera();
        let ahead = Aabb::new(Vec3::new(-1.0, -1.0, 10.0), Vec3::new(1.0, 1.0, 12.0));
        let behind = Aabb::new(Vec3::new(-1.0, -1.0, -12.0), Vec3::new(1.0, 1.0, -10.0));
        let beyond = Aabb::new(Vec3::new(-1.0, -1.0, 200.0), Vec3::new(1.0, 1.0, 210.0));
        let beside = Aabb::new(Vec3::new(50.0, -1.0, 5.0), Vec3::new(52.0, 1.0, 6.0));
        assert!(f.contains_aabb(&ahead));
        assert!(!f.contains_aabb(&behind));
        assert!(!f.contains_aabb(&beyond));
        assert!(!f.contains_aabb(&beside));
    }

    #[test]
    fn straddling_box_is_kept() {
        let f = camera();
        let straddle = Aabb::new(Vec3::new(-1.0, -1.0, -5.0), Vec3::new(1.0, 1.0, 5.0));
        assert!(f.contains_aabb(&straddle));
    }

    #[test]
    fn identity_matrix_is_unit_cube() {
        #[rustfmt::skip]
        let m = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        let f = Frustum::from_view_projection(&m);
        assert!(f.contains_point(Vec3::ZERO));
        assert!(f.contains_point(Vec3::new(0.9, -0.9, 0.5)));
        assert!(!f.contains_point(Vec3::new(1.5, 0.0, 0.0)));
        assert!(!f.contains_point(Vec3::new(0.0, 0.0, -1.5)));
    }
}
