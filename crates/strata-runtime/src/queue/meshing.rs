use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use hashbrown::HashSet;
use parking_lot::{Condvar, Mutex};
use strata_world::{ChunkPosition, SectionPosition};

use super::comparator::QueueComparator;
use crate::item::WorkItem;

#[derive(Default)]
struct Inner {
    items: VecDeque<WorkItem>,
    positions: HashSet<SectionPosition>,
    comparator: QueueComparator,
}

/// Priority queue of sections waiting for a mesher, nearest to the camera first.
///
/// A position is queued at most once. Sorting and waking the workers happen
/// under the same lock.
#[derive(Default)]
pub struct MeshingQueue {
    inner: Mutex<Inner>,
    ready: Condvar,
    stopped: AtomicBool,
}

impl MeshingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item. Returns false if the position is already waiting.
    pub fn queue(&self, item: WorkItem) -> bool {
        let mut inner = self.inner.lock();
        if !inner.positions.insert(item.position) {
            return false;
        }
        log::trace!(target: "queue", "queued {:?}", item.position);
        inner.items.push_back(item);
        true
    }

    /// Re-sorts by camera distance and wakes every waiting worker.
    pub fn sort_and_wake(&self) {
        let mut inner = self.inner.lock();
        let Inner {
            items, comparator, ..
        } = &mut *inner;
        comparator.sort(items);
        if !items.is_empty() {
            self.ready.notify_all();
        }
    }

    /// Moves the sort origin; re-sorts only when the camera changed section.
    pub fn set_camera(&self, camera: SectionPosition) {
        let mut inner = self.inner.lock();
        let Inner {
            items, comparator, ..
        } = &mut *inner;
        if comparator.update(camera) {
            comparator.sort(items);
        }
    }

    pub fn pop(&self) -> Option<WorkItem> {
        let mut inner = self.inner.lock();
        let item = inner.items.pop_front()?;
        inner.positions.remove(&item.position);
        Some(item)
    }

    /// Blocks until an item is available. Returns `None` once the queue is stopped.
    pub fn pop_blocking(&self) -> Option<WorkItem> {
        let mut inner = self.inner.lock();
        self.ready.wait_while(&mut inner, |inner| {
            inner.items.is_empty() && !self.stopped.load(Ordering::Acquire)
        });
        if self.stopped.load(Ordering::Acquire) {
            return None;
        }
        let item = inner.items.pop_front()?;
        inner.positions.remove(&item.position);
        Some(item)
    }

    pub fn remove(&self, position: SectionPosition) -> bool {
        let mut inner = self.inner.lock();
        if !inner.positions.remove(&position) {
            return false;
        }
        inner.items.retain(|i| *i != position);
        true
    }

    pub fn remove_chunk(&self, chunk: ChunkPosition) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.items.len();
        inner.items.retain(|i| i.chunk() != chunk);
        inner.positions.retain(|p| p.chunk() != chunk);
        before - inner.items.len()
    }

    /// Removes and returns every item for which `keep` is false.
    pub fn drain_unless(&self, mut keep: impl FnMut(&WorkItem) -> bool) -> Vec<WorkItem> {
        let mut inner = self.inner.lock();
        let mut dropped = Vec::new();
        let mut kept = VecDeque::with_capacity(inner.items.len());
        for item in inner.items.drain(..) {
            if keep(&item) {
                kept.push_back(item);
            } else {
                dropped.push(item);
            }
        }
        inner.items = kept;
        for item in &dropped {
            inner.positions.remove(&item.position);
        }
        dropped
    }

    pub fn contains(&self, position: SectionPosition) -> bool {
        self.inner.lock().positions.contains(&position)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.items.clear();
        inner.positions.clear();
    }

    /// Releases every blocked worker for good.
    pub fn stop(&self) {
        let _inner = self.inner.lock();
        self.stopped.store(true, Ordering::Release);
        self.ready.notify_all();
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}
