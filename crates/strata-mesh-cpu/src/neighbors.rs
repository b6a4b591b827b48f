use std::sync::Arc;

use strata_blocks::Block;
use strata_world::{Direction, InSectionPosition, Section, SectionPosition};

/// Immutable view of a section and its six face neighbours, captured once per build.
/// Missing neighbours read as air.
#[derive(Clone, Debug)]
pub struct NeighborSnapshot {
    pub position: SectionPosition,
    pub center: Arc<Section>,
    pub neighbours: [Option<Arc<Section>>; 6],
}

impl NeighborSnapshot {
    pub fn new(position: SectionPosition, center: Arc<Section>, neighbours: [Option<Arc<Section>>; 6]) -> Self {
        Self {
            position,
            center,
            neighbours,
        }
    }

    /// Revisions of the six neighbours at capture, zero where one is missing.
    #[inline]
    pub fn neighbour_revisions(&self) -> [u64; 6] {
        Self::revisions_of(&self.neighbours)
    }

    /// Revisions of a neighbour array as returned by `World::direct_neighbours`.
    pub fn revisions_of(neighbours: &[Option<Arc<Section>>; 6]) -> [u64; 6] {
        neighbours.each_ref().map(|n| n.as_ref().map_or(0, |s| s.revision()))
    }

    #[inline]
    pub fn neighbour(&self, dir: Direction) -> Option<&Arc<Section>> {
        self.neighbours[dir.index()].as_ref()
    }

    /// Block at local coordinates that may step one block outside the section along one axis.
    #[inline]
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> Block {
        let inside = |v: i32| (0..16).contains(&v);
        if inside(x) && inside(y) && inside(z) {
            return self
                .center
                .get(InSectionPosition::new(x as u8, y as u8, z as u8));
        }
        let dir = if y < 0 {
            Direction::Down
        } else if y > 15 {
            Direction::Up
        } else if z < 0 {
            Direction::North
        } else if z > 15 {
            Direction::South
        } else if x < 0 {
            Direction::West
        } else {
            Direction::East
        };
        let Some(n) = self.neighbour(dir) else {
            return Block::AIR;
        };
        let wrap = |v: i32| v.rem_euclid(16) as u8;
        n.get(InSectionPosition::new(wrap(x), wrap(y), wrap(z)))
    }

    /// Block one step from `(x, y, z)` through `dir`.
    #[inline]
    pub fn step(&self, x: i32, y: i32, z: i32, dir: Direction) -> Block {
        let (dx, dy, dz) = dir.vector();
        self.block_at(x + dx, y + dy, z + dz)
    }
}
