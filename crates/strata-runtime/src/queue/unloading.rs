use std::collections::VecDeque;

use parking_lot::Mutex;
use strata_mesh_cpu::SectionMeshes;

use crate::gpu::GpuBackend;

/// Retired meshes waiting for their GPU resources to be released on the render thread.
#[derive(Default)]
pub struct UnloadingQueue {
    meshes: Mutex<VecDeque<SectionMeshes>>,
}

impl UnloadingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force_queue(&self, mesh: SectionMeshes) {
        self.meshes.lock().push_back(mesh);
    }

    pub fn force_queue_all(&self, meshes: impl IntoIterator<Item = SectionMeshes>) {
        self.meshes.lock().extend(meshes);
    }

    /// Releases at most `max` meshes. Returns how many were processed.
    pub fn work(&self, backend: &mut dyn GpuBackend, max: usize) -> usize {
        let batch: Vec<SectionMeshes> = {
            let mut meshes = self.meshes.lock();
            let n = max.min(meshes.len());
            meshes.drain(..n).collect()
        };
        let n = batch.len();
        for mesh in batch {
            release(mesh, backend);
        }
        n
    }

    /// Releases everything regardless of the budget.
    pub fn clear(&self, backend: &mut dyn GpuBackend) -> usize {
        let all: Vec<SectionMeshes> = self.meshes.lock().drain(..).collect();
        let n = all.len();
        for mesh in all {
            release(mesh, backend);
        }
        n
    }

    pub fn len(&self) -> usize {
        self.meshes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn release(mut mesh: SectionMeshes, backend: &mut dyn GpuBackend) {
    if let Some(handle) = mesh.take_for_unload() {
        backend.free(handle);
    }
}
