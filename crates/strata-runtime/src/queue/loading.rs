use std::collections::VecDeque;

use hashbrown::HashSet;
use parking_lot::Mutex;
use strata_world::{ChunkPosition, SectionPosition};

use crate::gpu::GpuBackend;
use crate::loaded::LoadedMeshes;

#[derive(Default)]
struct Inner {
    order: VecDeque<SectionPosition>,
    pending: HashSet<SectionPosition>,
}

/// Sections whose freshly installed mesh still needs a GPU upload.
/// Drained on the render thread under a per-frame budget.
#[derive(Default)]
pub struct LoadingQueue {
    inner: Mutex<Inner>,
}

impl LoadingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self, position: SectionPosition) -> bool {
        let mut inner = self.inner.lock();
        if !inner.pending.insert(position) {
            return false;
        }
        inner.order.push_back(position);
        true
    }

    pub fn remove(&self, position: SectionPosition) -> bool {
        let mut inner = self.inner.lock();
        if !inner.pending.remove(&position) {
            return false;
        }
        inner.order.retain(|p| *p != position);
        true
    }

    pub fn remove_chunk(&self, chunk: ChunkPosition) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.order.len();
        inner.order.retain(|p| p.chunk() != chunk);
        inner.pending.retain(|p| p.chunk() != chunk);
        before - inner.order.len()
    }

    fn pop_batch(&self, max: usize) -> Vec<SectionPosition> {
        let mut inner = self.inner.lock();
        let n = max.min(inner.order.len());
        let batch: Vec<_> = inner.order.drain(..n).collect();
        for p in &batch {
            inner.pending.remove(p);
        }
        batch
    }

    /// Uploads at most `max` pending meshes. Returns how many reached the GPU.
    pub fn work(&self, loaded: &LoadedMeshes, backend: &mut dyn GpuBackend, max: usize) -> usize {
        let mut uploaded = 0;
        for position in self.pop_batch(max) {
            if loaded.upload(position, backend) {
                uploaded += 1;
            }
        }
        if uploaded > 0 {
            log::trace!(target: "queue", "uploaded {uploaded} meshes, {} pending", self.len());
        }
        uploaded
    }

    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.order.clear();
        inner.pending.clear();
    }
}
