use hashbrown::HashMap;
use strata_mesh_cpu::{MeshHandle, SectionMeshes};

/// The graphics side of the pipeline. Only ever called from the render thread.
pub trait GpuBackend {
    fn upload(&mut self, mesh: &SectionMeshes) -> MeshHandle;
    fn free(&mut self, handle: MeshHandle);
}

/// Backend without a device: hands out ids and keeps books, which is all the
/// pipeline needs for headless runs and tests. Freeing an unknown handle aborts.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next: u64,
    live: HashMap<u64, usize>,
    uploads: usize,
    freed: usize,
    bytes: usize,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles currently resident.
    pub fn live(&self) -> usize {
        self.live.len()
    }

    pub fn uploads(&self) -> usize {
        self.uploads
    }

    pub fn freed(&self) -> usize {
        self.freed
    }

    /// Bytes of geometry currently resident.
    pub fn resident_bytes(&self) -> usize {
        self.bytes
    }

    pub fn is_live(&self, handle: MeshHandle) -> bool {
        self.live.contains_key(&handle.0)
    }
}

impl GpuBackend for HeadlessBackend {
    fn upload(&mut self, mesh: &SectionMeshes) -> MeshHandle {
        self.next += 1;
        let size = mesh.byte_size();
        self.live.insert(self.next, size);
        self.uploads += 1;
        self.bytes += size;
        MeshHandle(self.next)
    }

    fn free(&mut self, handle: MeshHandle) {
        let Some(size) = self.live.remove(&handle.0) else {
            panic!("mesh handle {} freed twice or never uploaded", handle.0);
        };
        self.freed += 1;
        self.bytes -= size;
    }
}
