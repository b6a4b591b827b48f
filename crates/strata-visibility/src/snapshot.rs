use strata_geom::{Aabb, Frustum, Vec3};
use strata_world::{BlockPosition, ChunkPosition, InSectionPosition, SectionPosition};

use crate::frustum_cache::FrustumCache;

/// One immutable generation of the visibility graph.
///
/// The grid covers every column within the view distance of the camera column.
/// Each column entry holds `sections + 2` flags: slot 0 is below the world,
/// slot `sections + 1` above it, and slot `i + 1` is section index `i`.
/// Readers get a whole generation or the previous one, never a mix.
pub struct VisibilitySnapshot {
    pub(crate) revision: u64,
    pub(crate) camera: SectionPosition,
    pub(crate) min_section: i32,
    pub(crate) sections: u32,
    pub(crate) view_distance: i32,
    pub(crate) occlusion_culling: bool,
    pub(crate) chunk_min: ChunkPosition,
    pub(crate) size: i32,
    pub(crate) columns: Vec<Option<Box<[bool]>>>,
    pub(crate) frustum: FrustumCache,
}

impl VisibilitySnapshot {
    pub(crate) fn empty(
        revision: u64,
        camera: SectionPosition,
        min_section: i32,
        sections: u32,
        view_distance: i32,
        occlusion_culling: bool,
        frustum: Frustum,
    ) -> Self {
        let size = 2 * view_distance + 1;
        let chunk_min = camera.chunk().offset(-view_distance, -view_distance);
        Self {
            revision,
            camera,
            min_section,
            sections,
            view_distance,
            occlusion_culling,
            chunk_min,
            size,
            columns: (0..(size * size) as usize).map(|_| None).collect(),
            frustum: FrustumCache::new(frustum, chunk_min, size, min_section, sections),
        }
    }

    #[inline]
    pub(crate) fn slot(&self, c: ChunkPosition) -> Option<usize> {
        let x = c.x - self.chunk_min.x;
        let z = c.z - self.chunk_min.z;
        (x >= 0 && z >= 0 && x < self.size && z < self.size).then(|| (x * self.size + z) as usize)
    }

    #[inline]
    pub(crate) fn column_mut(&mut self, c: ChunkPosition) -> Option<&mut [bool]> {
        let i = self.slot(c)?;
        let len = self.sections as usize + 2;
        let col = self.columns[i].get_or_insert_with(|| vec![false; len].into_boxed_slice());
        Some(&mut **col)
    }

    #[inline]
    fn column(&self, c: ChunkPosition) -> Option<&[bool]> {
        self.slot(c).and_then(|i| self.columns[i].as_deref())
    }

    /// False for the placeholder published before the first camera; it sees nothing.
    #[inline]
    pub fn is_built(&self) -> bool {
        self.revision > 0
    }

    /// Generation counter; increases with every rebuild.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    pub fn camera(&self) -> SectionPosition {
        self.camera
    }

    #[inline]
    pub fn view_distance(&self) -> i32 {
        self.view_distance
    }

    #[inline]
    pub fn occlusion_culling(&self) -> bool {
        self.occlusion_culling
    }

    #[inline]
    pub fn frustum(&self) -> &Frustum {
        self.frustum.frustum()
    }

    #[inline]
    pub fn is_in_view_distance(&self, c: ChunkPosition) -> bool {
        c.chebyshev(self.camera.chunk()) <= self.view_distance
    }

    /// Whether the flood fill reached any section of the column (or, without occlusion
    /// culling, whether the column is in range and in the frustum).
    pub fn is_chunk_visible(&self, c: ChunkPosition) -> bool {
        if !self.is_built() || !self.is_in_view_distance(c) || !self.frustum.contains_column(c) {
            return false;
        }
        !self.occlusion_culling || self.column(c).is_some_and(|col| col.iter().any(|v| *v))
    }

    /// Whether the flood fill marked the section, ignoring the frustum.
    pub fn is_marked(&self, pos: SectionPosition) -> bool {
        let index = pos.y - self.min_section;
        if index < -1 || index > self.sections as i32 {
            return false;
        }
        self.column(pos.chunk())
            .is_some_and(|col| col[(index + 1) as usize])
    }

    /// Visibility of the occupied sub-volume `min..=max` of a section.
    /// The camera section is always visible.
    pub fn is_section_visible(
        &self,
        chunk: ChunkPosition,
        height: i32,
        min: InSectionPosition,
        max: InSectionPosition,
        check_chunk: bool,
    ) -> bool {
        if !self.is_built() {
            return false;
        }
        if check_chunk && !self.is_chunk_visible(chunk) {
            return false;
        }
        let pos = chunk.section(height);
        if pos == self.camera {
            return true;
        }
        if !self.is_in_view_distance(chunk) {
            return false;
        }
        if self.occlusion_culling && !self.is_marked(pos) {
            return false;
        }
        let o = pos.origin();
        let aabb = Aabb::new(
            o + Vec3::new(min.x as f32, min.y as f32, min.z as f32),
            o + Vec3::new(max.x as f32 + 1.0, max.y as f32 + 1.0, max.z as f32 + 1.0),
        );
        self.frustum.contains_in_column(chunk, &aabb)
    }

    /// Whole-section shorthand for `is_section_visible`.
    #[inline]
    pub fn is_position_visible(&self, pos: SectionPosition) -> bool {
        self.is_section_visible(pos.chunk(), pos.y, InSectionPosition::MIN, InSectionPosition::MAX, true)
    }

    /// True when no section touched by the box was reached by the flood fill.
    /// Without occlusion culling this degrades to "outside the frustum".
    pub fn is_aabb_occluded(&self, aabb: &Aabb) -> bool {
        if !self.is_built() {
            return true;
        }
        if !self.occlusion_culling {
            return !self.frustum.frustum().contains_aabb(aabb);
        }
        let lo = BlockPosition::containing(aabb.min).section();
        let hi = BlockPosition::containing(aabb.max).section();
        for x in lo.x..=hi.x {
            for z in lo.z..=hi.z {
                let Some(col) = self.column(ChunkPosition::new(x, z)) else {
                    continue;
                };
                for y in lo.y..=hi.y {
                    let index = y - self.min_section;
                    if index < 0 || index >= self.sections as i32 {
                        return false;
                    }
                    if col[(index + 1) as usize] {
                        return false;
                    }
                }
            }
        }
        true
    }

    pub fn is_aabb_visible(&self, aabb: &Aabb) -> bool {
        !self.is_aabb_occluded(aabb) && self.frustum.frustum().contains_aabb(aabb)
    }

    /// All marked sections, for diagnostics and tests.
    pub fn marked_sections(&self) -> Vec<SectionPosition> {
        let mut out = Vec::new();
        for (i, col) in self.columns.iter().enumerate() {
            let Some(col) = col else { continue };
            let x = self.chunk_min.x + i as i32 / self.size;
            let z = self.chunk_min.z + i as i32 % self.size;
            for (slot, v) in col.iter().enumerate() {
                if *v {
                    out.push(SectionPosition::new(x, self.min_section + slot as i32 - 1, z));
                }
            }
        }
        out
    }
}
