use strata_geom::Vec3;
use strata_world::{ChunkPosition, SectionPosition};

/// A section waiting in (or taken from) the meshing queue.
///
/// Equality only looks at the position, so an item can be matched against a
/// plain `SectionPosition`.
#[derive(Debug)]
pub struct WorkItem {
    pub position: SectionPosition,
    pub center: Vec3,
    pub(crate) distance: i64,
    pub(crate) sort: u64,
}

impl WorkItem {
    pub fn new(position: SectionPosition) -> Self {
        Self {
            position,
            center: position.center(),
            distance: 0,
            sort: 0,
        }
    }

    #[inline]
    pub fn chunk(&self) -> ChunkPosition {
        self.position.chunk()
    }

    /// Cached squared distance to the camera section at the last sort.
    #[inline]
    pub fn distance(&self) -> i64 {
        self.distance
    }
}

impl PartialEq for WorkItem {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl Eq for WorkItem {}

impl PartialEq<SectionPosition> for WorkItem {
    fn eq(&self, other: &SectionPosition) -> bool {
        self.position == *other
    }
}
