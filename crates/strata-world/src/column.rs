use std::sync::Arc;

use crate::direction::Direction;
use crate::position::ChunkPosition;
use crate::section::Section;

/// Slot of a column in the world's arena.
pub type ColumnId = usize;

/// A vertical stack of sections plus links to its four lateral neighbours.
#[derive(Clone, Debug)]
pub struct Column {
    pub position: ChunkPosition,
    pub(crate) sections: Vec<Option<Arc<Section>>>,
    pub(crate) neighbours: [Option<ColumnId>; 4],
    pub(crate) complete: bool,
}

impl Column {
    pub(crate) fn new(position: ChunkPosition, sections: Vec<Option<Arc<Section>>>) -> Self {
        Self {
            position,
            sections,
            neighbours: [None; 4],
            complete: false,
        }
    }

    /// Section by index relative to the dimension's lowest section.
    #[inline]
    pub fn section(&self, index: usize) -> Option<&Arc<Section>> {
        self.sections.get(index).and_then(|s| s.as_ref())
    }

    #[inline]
    pub fn sections(&self) -> &[Option<Arc<Section>>] {
        &self.sections
    }

    #[inline]
    pub fn neighbour(&self, dir: Direction) -> Option<ColumnId> {
        dir.side_index().and_then(|i| self.neighbours[i])
    }

    /// All four lateral neighbours are loaded and linked.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_empty(&self) -> bool {
        self.sections
            .iter()
            .all(|s| s.as_ref().is_none_or(|s| s.is_empty()))
    }

    pub(crate) fn refresh_complete(&mut self) -> bool {
        let complete = self.neighbours.iter().all(Option::is_some);
        let changed = complete != self.complete;
        self.complete = complete;
        changed
    }
}
