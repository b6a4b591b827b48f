use hashbrown::HashSet;
use parking_lot::Mutex;
use strata_world::{ChunkPosition, SectionPosition};

/// Sections that had something to draw but were not visible when queued.
/// They are re-evaluated after each visibility rebuild.
#[derive(Default)]
pub struct CulledQueue {
    positions: Mutex<HashSet<SectionPosition>>,
}

impl CulledQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self, position: SectionPosition) -> bool {
        self.positions.lock().insert(position)
    }

    pub fn remove(&self, position: SectionPosition) -> bool {
        self.positions.lock().remove(&position)
    }

    pub fn remove_chunk(&self, chunk: ChunkPosition) -> usize {
        let mut positions = self.positions.lock();
        let before = positions.len();
        positions.retain(|p| p.chunk() != chunk);
        before - positions.len()
    }

    pub fn take_all(&self) -> Vec<SectionPosition> {
        self.positions.lock().drain().collect()
    }

    pub fn contains(&self, position: SectionPosition) -> bool {
        self.positions.lock().contains(&position)
    }

    pub fn len(&self) -> usize {
        self.positions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.positions.lock().clear();
    }
}
