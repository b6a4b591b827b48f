use std::sync::atomic::{AtomicU8, Ordering};

use strata_geom::{Aabb, Frustum, Vec3};
use strata_world::{ChunkPosition, SECTION_SIZE};

const UNKNOWN: u8 = 0;
const INSIDE: u8 = 1;
const OUTSIDE: u8 = 2;

/// Per-column frustum verdicts for one graph generation, filled lazily.
/// Concurrent readers may race to fill a slot; they always store the same verdict.
pub struct FrustumCache {
    frustum: Frustum,
    chunk_min: ChunkPosition,
    size: i32,
    min_y: f32,
    max_y: f32,
    columns: Box<[AtomicU8]>,
}

impl FrustumCache {
    pub fn new(frustum: Frustum, chunk_min: ChunkPosition, size: i32, min_section: i32, sections: u32) -> Self {
        let n = (size.max(0) as usize).pow(2);
        Self {
            frustum,
            chunk_min,
            size,
            min_y: (min_section * SECTION_SIZE) as f32,
            max_y: ((min_section + sections as i32) * SECTION_SIZE) as f32,
            columns: (0..n).map(|_| AtomicU8::new(UNKNOWN)).collect(),
        }
    }

    #[inline]
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    #[inline]
    fn slot(&self, c: ChunkPosition) -> Option<usize> {
        let x = c.x - self.chunk_min.x;
        let z = c.z - self.chunk_min.z;
        (x >= 0 && z >= 0 && x < self.size && z < self.size).then(|| (x * self.size + z) as usize)
    }

    fn column_aabb(&self, c: ChunkPosition) -> Aabb {
        let s = SECTION_SIZE as f32;
        Aabb::new(
            Vec3::new(c.x as f32 * s, self.min_y, c.z as f32 * s),
            Vec3::new((c.x + 1) as f32 * s, self.max_y, (c.z + 1) as f32 * s),
        )
    }

    /// Whether any part of the column can be inside the frustum.
    pub fn contains_column(&self, c: ChunkPosition) -> bool {
        let Some(i) = self.slot(c) else {
            return self.frustum.contains_aabb(&self.column_aabb(c));
        };
        match self.columns[i].load(Ordering::Relaxed) {
            INSIDE => true,
            OUTSIDE => false,
            _ => {
                let inside = self.frustum.contains_aabb(&self.column_aabb(c));
                self.columns[i].store(if inside { INSIDE } else { OUTSIDE }, Ordering::Relaxed);
                inside
            }
        }
    }

    /// Column verdict first, then the box itself.
    #[inline]
    pub fn contains_in_column(&self, c: ChunkPosition, aabb: &Aabb) -> bool {
        self.contains_column(c) && self.frustum.contains_aabb(aabb)
    }
}
