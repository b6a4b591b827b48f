use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::Deserialize;
use strata_blocks::{Block, BlockRegistry};

use crate::column::{Column, ColumnId};
use crate::direction::Direction;
use crate::event::WorldEvent;
use crate::position::{BlockPosition, ChunkPosition, SectionPosition};
use crate::section::Section;

/// World behind the reader/writer lock shared by the render thread and the meshing workers.
pub type SharedWorld = Arc<RwLock<World>>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("column {0:?} is not loaded")]
    ColumnNotLoaded(ChunkPosition),
    #[error("section height {0} is outside the dimension")]
    OutOfBounds(i32),
    #[error("column {0:?} has {1} sections, dimension has {2}")]
    SectionCount(ChunkPosition, usize, usize),
}

/// Vertical extent of the world in sections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Dimension {
    pub min_section: i32,
    pub sections: u32,
}

impl Default for Dimension {
    fn default() -> Self {
        Self {
            min_section: -4,
            sections: 24,
        }
    }
}

impl Dimension {
    #[inline]
    pub fn max_section(&self) -> i32 {
        self.min_section + self.sections as i32 - 1
    }

    #[inline]
    pub fn index_of(&self, height: i32) -> Option<usize> {
        let i = height - self.min_section;
        (i >= 0 && i < self.sections as i32).then_some(i as usize)
    }

    #[inline]
    pub fn contains(&self, height: i32) -> bool {
        self.index_of(height).is_some()
    }
}

pub struct World {
    dimension: Dimension,
    registry: Arc<BlockRegistry>,
    columns: Vec<Option<Column>>,
    free: Vec<ColumnId>,
    index: HashMap<ChunkPosition, ColumnId>,
    revision: u64,
    subscribers: Vec<Sender<WorldEvent>>,
}

impl World {
    pub fn new(dimension: Dimension, registry: Arc<BlockRegistry>) -> Self {
        Self {
            dimension,
            registry,
            columns: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            revision: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn into_shared(self) -> SharedWorld {
        Arc::new(RwLock::new(self))
    }

    #[inline]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    #[inline]
    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    /// New event stream; receives everything published after this call.
    pub fn subscribe(&mut self) -> Receiver<WorldEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self, event: WorldEvent) {
        log::trace!(target: "world", "{event:?}");
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    #[inline]
    pub fn column_id(&self, pos: ChunkPosition) -> Option<ColumnId> {
        self.index.get(&pos).copied()
    }

    #[inline]
    pub fn column(&self, pos: ChunkPosition) -> Option<&Column> {
        self.column_id(pos).and_then(|id| self.column_by_id(id))
    }

    #[inline]
    pub fn column_by_id(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id).and_then(|c| c.as_ref())
    }

    /// Follows a lateral link from `id`.
    #[inline]
    pub fn neighbour_of(&self, id: ColumnId, dir: Direction) -> Option<ColumnId> {
        self.column_by_id(id).and_then(|c| c.neighbour(dir))
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter_map(|c| c.as_ref())
    }

    pub fn column_count(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn section(&self, pos: SectionPosition) -> Option<&Arc<Section>> {
        let index = self.dimension.index_of(pos.y)?;
        self.column(pos.chunk())?.section(index)
    }

    pub fn get_block(&self, pos: BlockPosition) -> Option<Block> {
        self.section(pos.section())
            .map(|s| s.get(pos.in_section()))
    }

    /// The six face-adjacent sections of `pos`, indexed by `Direction::index`.
    /// Lateral entries follow the neighbour table; vertical entries stay inside the column.
    pub fn direct_neighbours(&self, pos: SectionPosition) -> [Option<Arc<Section>>; 6] {
        let mut out: [Option<Arc<Section>>; 6] = Default::default();
        let Some(id) = self.column_id(pos.chunk()) else {
            return out;
        };
        let Some(index) = self.dimension.index_of(pos.y) else {
            return out;
        };
        for dir in Direction::ALL {
            let n = match dir {
                Direction::Down => index
                    .checked_sub(1)
                    .and_then(|i| self.column_by_id(id)?.section(i)),
                Direction::Up => self.column_by_id(id).and_then(|c| c.section(index + 1)),
                _ => self
                    .neighbour_of(id, dir)
                    .and_then(|n| self.column_by_id(n)?.section(index)),
            };
            out[dir.index()] = n.cloned();
        }
        out
    }

    /// Loads (or replaces) a column, links it with its lateral neighbours, and
    /// publishes creation plus any completeness changes.
    pub fn insert_column(
        &mut self,
        pos: ChunkPosition,
        sections: Vec<Option<Section>>,
    ) -> Result<ColumnId, WorldError> {
        let expected = self.dimension.sections as usize;
        if sections.len() != expected {
            return Err(WorldError::SectionCount(pos, sections.len(), expected));
        }
        if self.index.contains_key(&pos) {
            self.remove_column(pos);
        }
        let mut stamped = Vec::with_capacity(sections.len());
        for s in sections {
            stamped.push(match s {
                Some(mut s) => {
                    s.set_revision(self.next_revision());
                    Some(Arc::new(s))
                }
                None => None,
            });
        }
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                self.columns.push(None);
                self.columns.len() - 1
            }
        };
        self.columns[id] = Some(Column::new(pos, stamped));
        self.index.insert(pos, id);

        let mut changed = Vec::new();
        for dir in Direction::SIDES {
            let Some(nid) = self.column_id(pos.neighbour(dir)) else {
                continue;
            };
            let (Some(side), Some(back)) = (dir.side_index(), dir.inverted().side_index()) else {
                continue;
            };
            if let Some(c) = self.columns[id].as_mut() {
                c.neighbours[side] = Some(nid);
            }
            if let Some(n) = self.columns[nid].as_mut() {
                n.neighbours[back] = Some(id);
                n.refresh_complete();
                changed.push((n.position, n.complete));
            }
        }
        if let Some(c) = self.columns[id].as_mut() {
            c.refresh_complete();
        }
        self.publish(WorldEvent::ChunkCreated(pos));
        for (chunk, complete) in changed {
            self.publish(WorldEvent::NeighbourChanged { chunk, complete });
        }
        log::debug!(target: "world", "loaded column {:?} ({} columns)", pos, self.index.len());
        Ok(id)
    }

    /// Unloads a column and unlinks it; neighbours become incomplete.
    pub fn remove_column(&mut self, pos: ChunkPosition) -> bool {
        let Some(id) = self.index.remove(&pos) else {
            return false;
        };
        let Some(column) = self.columns[id].take() else {
            return false;
        };
        self.free.push(id);
        let mut changed = Vec::new();
        for dir in Direction::SIDES {
            let (Some(side), Some(back)) = (dir.side_index(), dir.inverted().side_index()) else {
                continue;
            };
            let Some(nid) = column.neighbours[side] else {
                continue;
            };
            if let Some(n) = self.columns[nid].as_mut() {
                n.neighbours[back] = None;
                n.refresh_complete();
                changed.push((n.position, n.complete));
            }
        }
        self.publish(WorldEvent::ChunkUnloaded(pos));
        for (chunk, complete) in changed {
            self.publish(WorldEvent::NeighbourChanged { chunk, complete });
        }
        true
    }

    /// Sets one block, stamping the section with a fresh revision. Returns the previous block.
    pub fn set_block(&mut self, pos: BlockPosition, block: Block) -> Result<Block, WorldError> {
        let spos = pos.section();
        let index = self
            .dimension
            .index_of(spos.y)
            .ok_or(WorldError::OutOfBounds(spos.y))?;
        let id = self
            .column_id(spos.chunk())
            .ok_or(WorldError::ColumnNotLoaded(spos.chunk()))?;
        let revision = self.next_revision();
        let registry = Arc::clone(&self.registry);
        let Some(column) = self.columns[id].as_mut() else {
            return Err(WorldError::ColumnNotLoaded(spos.chunk()));
        };
        let slot = &mut column.sections[index];
        if slot.is_none() {
            if block.is_air() {
                return Ok(Block::AIR);
            }
            *slot = Some(Arc::new(Section::new()));
        }
        let Some(section) = slot.as_mut() else {
            return Ok(Block::AIR);
        };
        let in_section = pos.in_section();
        if section.get(in_section) == block {
            return Ok(block);
        }
        // Readers holding the previous Arc keep their snapshot.
        let section = Arc::make_mut(section);
        let prev = section.set(in_section, block, &registry);
        let occlusion_changed = section.refresh(&registry);
        section.set_revision(revision);
        self.publish(WorldEvent::SectionChanged {
            position: spos,
            in_section,
        });
        if occlusion_changed {
            self.publish(WorldEvent::OcclusionChanged(spos));
        }
        Ok(prev)
    }

    /// Replaces a whole section at once.
    pub fn set_section(&mut self, pos: SectionPosition, section: Option<Section>) -> Result<(), WorldError> {
        let index = self
            .dimension
            .index_of(pos.y)
            .ok_or(WorldError::OutOfBounds(pos.y))?;
        let id = self
            .column_id(pos.chunk())
            .ok_or(WorldError::ColumnNotLoaded(pos.chunk()))?;
        let revision = self.next_revision();
        let Some(column) = self.columns[id].as_mut() else {
            return Err(WorldError::ColumnNotLoaded(pos.chunk()));
        };
        let before = column.sections[index].as_ref().map(|s| s.occlusion());
        let section = section.map(|mut s| {
            s.set_revision(revision);
            Arc::new(s)
        });
        let after = section.as_ref().map(|s| s.occlusion());
        column.sections[index] = section;
        self.publish(WorldEvent::SectionReplaced(pos));
        if before.unwrap_or_default() != after.unwrap_or_default() {
            self.publish(WorldEvent::OcclusionChanged(pos));
        }
        Ok(())
    }
}
