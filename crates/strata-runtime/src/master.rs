use std::sync::Arc;

use strata_visibility::VisibilitySnapshot;
use strata_world::{ChunkPosition, Section, SectionPosition};

use crate::context::RendererShared;
use crate::item::WorkItem;

/// Decides what happens to a section that might need a mesh: queue it, park it in
/// the culled set, or unload it. All entry points ignore columns whose four
/// neighbours are not loaded yet.
pub struct QueueMaster<'a> {
    shared: &'a RendererShared,
}

impl<'a> QueueMaster<'a> {
    pub fn new(shared: &'a RendererShared) -> Self {
        Self { shared }
    }

    /// Returns true if a new work item was created.
    fn queue(&self, visibility: &VisibilitySnapshot, position: SectionPosition, section: &Section, force: bool) -> bool {
        let visible = force
            || visibility.is_section_visible(position.chunk(), position.y, section.min(), section.max(), true);
        if visible {
            self.shared.culled.remove(position);
            return self.shared.meshing.queue(WorkItem::new(position));
        }
        self.shared.culled.queue(position);
        false
    }

    /// Queues one section. `force` skips the visibility test (edits).
    pub fn try_queue(&self, position: SectionPosition, force: bool) -> bool {
        if !self.shared.can_queue() {
            return false;
        }
        let section = {
            let world = self.shared.world.read();
            if !world.dimension().contains(position.y) {
                return false;
            }
            let Some(column) = world.column(position.chunk()) else {
                return false;
            };
            if !column.is_complete() {
                return false;
            }
            world.section(position).cloned()
        };
        let Some(section) = section.filter(|s| !s.is_empty()) else {
            self.shared.unload_section(position);
            return false;
        };
        let visibility = self.shared.graph.snapshot();
        if !self.queue(&visibility, position, &section, force) {
            return false;
        }
        self.shared.meshing.sort_and_wake();
        true
    }

    /// Queues every section of a column. A column that already has meshes is skipped
    /// unless `ignore_loaded`. Returns the number of new work items.
    pub fn try_queue_chunk(&self, chunk: ChunkPosition, ignore_loaded: bool, force: bool) -> usize {
        if !self.shared.can_queue() {
            return 0;
        }
        if !ignore_loaded && self.shared.loaded.contains(chunk) {
            return 0;
        }
        let sections: Vec<(SectionPosition, Arc<Section>)> = {
            let world = self.shared.world.read();
            let min = world.dimension().min_section;
            let Some(column) = world.column(chunk) else {
                return 0;
            };
            if !column.is_complete() {
                return 0;
            }
            column
                .sections()
                .iter()
                .enumerate()
                .filter_map(|(i, s)| Some((chunk.section(min + i as i32), Arc::clone(s.as_ref()?))))
                .collect()
        };
        let visibility = self.shared.graph.snapshot();
        let mut added = 0;
        for (position, section) in sections {
            if section.is_empty() {
                self.shared.unload_section(position);
            } else if self.queue(&visibility, position, &section, force) {
                added += 1;
            }
        }
        if added > 0 {
            log::trace!(target: "queue", "queued {added} sections of {chunk:?}");
            self.shared.meshing.sort_and_wake();
        }
        added
    }

    /// Re-evaluates the culled set against the current graph and sorts once at the end.
    /// Positions whose column went incomplete are dropped; completion re-queues them.
    pub fn requeue_culled(&self) -> usize {
        if !self.shared.can_queue() {
            return 0;
        }
        let positions = self.shared.culled.take_all();
        if positions.is_empty() {
            return 0;
        }
        let sections: Vec<(SectionPosition, Option<Arc<Section>>)> = {
            let world = self.shared.world.read();
            positions
                .into_iter()
                .filter(|p| world.column(p.chunk()).is_some_and(|c| c.is_complete()))
                .map(|p| (p, world.section(p).cloned()))
                .collect()
        };
        let visibility = self.shared.graph.snapshot();
        let mut added = 0;
        for (position, section) in sections {
            match section {
                Some(section) if !section.is_empty() => {
                    if self.queue(&visibility, position, &section, false) {
                        added += 1;
                    }
                }
                _ => self.shared.unload_section(position),
            }
        }
        if added > 0 {
            log::debug!(target: "queue", "{added} culled sections became visible");
            self.shared.meshing.sort_and_wake();
        }
        added
    }

    /// Queues every loaded column, meshed or not.
    pub fn try_queue_world(&self) -> usize {
        if !self.shared.can_queue() {
            return 0;
        }
        let chunks: Vec<ChunkPosition> = self.shared.world.read().columns().map(|c| c.position).collect();
        let added: usize = chunks
            .into_iter()
            .map(|c| self.try_queue_chunk(c, true, false))
            .sum();
        log::debug!(target: "queue", "queued {added} sections from the whole world");
        added
    }
}
