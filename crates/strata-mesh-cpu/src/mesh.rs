use strata_geom::{Aabb, Vec3};
use strata_world::{InSectionPosition, SectionPosition};

use crate::mesh_build::MeshBuild;

/// Opaque id of an uploaded GPU resource.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MeshState {
    Building,
    Finished,
    Uploaded(MeshHandle),
    Unloaded,
}

/// Geometry of one section, split by render pass and tagged with the occupied sub-volume.
#[derive(Clone, Debug)]
pub struct SectionMeshes {
    pub position: SectionPosition,
    pub min: InSectionPosition,
    pub max: InSectionPosition,
    /// Revision of the section the geometry was built from.
    pub revision: u64,
    /// Revisions of the six face neighbours at capture, indexed by `Direction::index`.
    pub neighbour_revisions: [u64; 6],
    pub opaque: Option<MeshBuild>,
    pub translucent: Option<MeshBuild>,
    state: MeshState,
}

impl SectionMeshes {
    pub fn new(position: SectionPosition, min: InSectionPosition, max: InSectionPosition, revision: u64) -> Self {
        Self {
            position,
            min,
            max,
            revision,
            neighbour_revisions: [0; 6],
            opaque: Some(MeshBuild::default()),
            translucent: Some(MeshBuild::default()),
            state: MeshState::Building,
        }
    }

    pub fn with_neighbour_revisions(mut self, revisions: [u64; 6]) -> Self {
        self.neighbour_revisions = revisions;
        self
    }

    /// True when `other` was built from a newer centre, or from the same centre
    /// with a neighbour that has since changed.
    pub fn is_older_than(&self, other: &SectionMeshes) -> bool {
        if self.revision != other.revision {
            return self.revision < other.revision;
        }
        self.neighbour_revisions
            .iter()
            .zip(&other.neighbour_revisions)
            .any(|(mine, theirs)| mine < theirs)
    }

    #[inline]
    pub fn state(&self) -> MeshState {
        self.state
    }

    /// Drops empty buffers and returns how many remain.
    pub fn clear_empty(&mut self) -> usize {
        let mut left = 0;
        for slot in [&mut self.opaque, &mut self.translucent] {
            if slot.as_ref().is_some_and(MeshBuild::is_empty) {
                *slot = None;
            }
            left += slot.is_some() as usize;
        }
        left
    }

    /// Seals the geometry. Inconsistent buffers or a second finish are fatal.
    pub fn finish(&mut self) {
        assert_eq!(
            self.state,
            MeshState::Building,
            "section mesh {:?} finished twice",
            self.position
        );
        for (name, build) in [("opaque", &self.opaque), ("translucent", &self.translucent)] {
            if let Some(Err(why)) = build.as_ref().map(MeshBuild::check_consistency) {
                panic!("{name} mesh of {:?} is inconsistent: {why}", self.position);
            }
        }
        self.state = MeshState::Finished;
    }

    /// Records the GPU handle. Only finished meshes can be uploaded.
    pub fn mark_uploaded(&mut self, handle: MeshHandle) {
        assert_eq!(
            self.state,
            MeshState::Finished,
            "section mesh {:?} uploaded from the wrong state",
            self.position
        );
        self.state = MeshState::Uploaded(handle);
    }

    /// Takes the GPU handle for release and marks the mesh unloaded.
    /// Releasing twice is a double free and aborts.
    pub fn take_for_unload(&mut self) -> Option<MeshHandle> {
        match self.state {
            MeshState::Unloaded => panic!("section mesh {:?} released twice", self.position),
            MeshState::Uploaded(h) => {
                self.state = MeshState::Unloaded;
                Some(h)
            }
            MeshState::Building | MeshState::Finished => {
                self.state = MeshState::Unloaded;
                None
            }
        }
    }

    /// World-space box of the occupied blocks.
    pub fn bbox(&self) -> Aabb {
        let o = self.position.origin();
        let min = Vec3::new(self.min.x as f32, self.min.y as f32, self.min.z as f32);
        let max = Vec3::new(
            self.max.x as f32 + 1.0,
            self.max.y as f32 + 1.0,
            self.max.z as f32 + 1.0,
        );
        Aabb::new(o + min, o + max)
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        self.position.center()
    }

    pub fn quad_count(&self) -> usize {
        self.opaque.as_ref().map_or(0, MeshBuild::quad_count)
            + self.translucent.as_ref().map_or(0, MeshBuild::quad_count)
    }

    pub fn byte_size(&self) -> usize {
        self.opaque.as_ref().map_or(0, MeshBuild::byte_size)
            + self.translucent.as_ref().map_or(0, MeshBuild::byte_size)
    }
}
