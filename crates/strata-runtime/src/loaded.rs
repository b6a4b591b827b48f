use hashbrown::HashMap;
use parking_lot::RwLock;
use strata_geom::Vec3;
use strata_mesh_cpu::{MeshBuild, MeshHandle, MeshState, SectionMeshes};
use strata_visibility::VisibilitySnapshot;
use strata_world::{ChunkPosition, SectionPosition};

use crate::gpu::GpuBackend;
use crate::queue::UnloadingQueue;

/// One pass of one section in the draw list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawEntry {
    pub position: SectionPosition,
    pub handle: MeshHandle,
    pub center: Vec3,
    pub quads: usize,
}

/// Per-frame draw list: opaque passes near to far, translucent passes far to near.
#[derive(Clone, Debug, Default)]
pub struct VisibleMeshes {
    pub opaque: Vec<DrawEntry>,
    pub translucent: Vec<DrawEntry>,
}

impl VisibleMeshes {
    /// Adds the uploaded passes of `mesh`; meshes still waiting for upload are skipped.
    pub fn add(&mut self, mesh: &SectionMeshes) {
        let MeshState::Uploaded(handle) = mesh.state() else {
            return;
        };
        let entry = |build: &MeshBuild| DrawEntry {
            position: mesh.position,
            handle,
            center: mesh.center(),
            quads: build.quad_count(),
        };
        if let Some(b) = &mesh.opaque {
            self.opaque.push(entry(b));
        }
        if let Some(b) = &mesh.translucent {
            self.translucent.push(entry(b));
        }
    }

    pub fn sort(&mut self, eye: Vec3) {
        let d = |e: &DrawEntry| (e.center - eye).length_sq();
        self.opaque.sort_by(|a, b| d(a).total_cmp(&d(b)));
        self.translucent.sort_by(|a, b| d(b).total_cmp(&d(a)));
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.translucent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.translucent.is_empty()
    }

    pub fn quads(&self) -> usize {
        self.opaque.iter().chain(&self.translucent).map(|e| e.quads).sum()
    }
}

/// Every installed section mesh, keyed by column then section height.
///
/// Retired meshes always leave through the `UnloadingQueue`, and only after
/// the cache lock is released.
#[derive(Default)]
pub struct LoadedMeshes {
    meshes: RwLock<HashMap<ChunkPosition, HashMap<i32, SectionMeshes>>>,
}

impl LoadedMeshes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a finished mesh, retiring whatever it replaces. A mesh built from an
    /// older section revision than the installed one, or from the same revision with
    /// older neighbours, is retired instead.
    pub fn install(&self, mesh: SectionMeshes, unloading: &UnloadingQueue) -> bool {
        assert_eq!(
            mesh.state(),
            MeshState::Finished,
            "installing unfinished mesh for {:?}",
            mesh.position
        );
        let position = mesh.position;
        let (installed, retired) = {
            let mut meshes = self.meshes.write();
            let column = meshes.entry(position.chunk()).or_default();
            let stale = column
                .get(&position.y)
                .is_some_and(|current| mesh.is_older_than(current));
            if stale {
                (false, Some(mesh))
            } else {
                (true, column.insert(position.y, mesh))
            }
        };
        if let Some(old) = retired {
            unloading.force_queue(old);
        }
        installed
    }

    /// Uploads the mesh at `position` if it is still waiting for the GPU.
    pub fn upload(&self, position: SectionPosition, backend: &mut dyn GpuBackend) -> bool {
        let mut meshes = self.meshes.write();
        let Some(mesh) = meshes
            .get_mut(&position.chunk())
            .and_then(|c| c.get_mut(&position.y))
        else {
            return false;
        };
        if mesh.state() != MeshState::Finished {
            return false;
        }
        let handle = backend.upload(mesh);
        mesh.mark_uploaded(handle);
        true
    }

    /// Evicts columns outside the view distance. Returns the evicted sections.
    pub fn cleanup(&self, visibility: &VisibilitySnapshot, unloading: &UnloadingQueue) -> Vec<SectionPosition> {
        let mut evicted = Vec::new();
        {
            let mut meshes = self.meshes.write();
            meshes.retain(|chunk, column| {
                if visibility.is_in_view_distance(*chunk) {
                    return true;
                }
                evicted.extend(column.drain().map(|(_, m)| m));
                false
            });
        }
        let positions: Vec<_> = evicted.iter().map(|m| m.position).collect();
        if !evicted.is_empty() {
            log::debug!(target: "queue", "evicted {} section meshes outside view distance", evicted.len());
            unloading.force_queue_all(evicted);
        }
        positions
    }

    pub fn clear(&self, unloading: &UnloadingQueue) -> usize {
        let all: Vec<SectionMeshes> = {
            let mut meshes = self.meshes.write();
            meshes.drain().flat_map(|(_, c)| c.into_values()).collect()
        };
        let n = all.len();
        unloading.force_queue_all(all);
        n
    }

    pub fn unload(&self, chunk: ChunkPosition, unloading: &UnloadingQueue) -> bool {
        let Some(column) = self.meshes.write().remove(&chunk) else {
            return false;
        };
        unloading.force_queue_all(column.into_values());
        true
    }

    pub fn unload_section(&self, position: SectionPosition, unloading: &UnloadingQueue) -> bool {
        let removed = {
            let mut meshes = self.meshes.write();
            let Some(column) = meshes.get_mut(&position.chunk()) else {
                return false;
            };
            let removed = column.remove(&position.y);
            if column.is_empty() {
                meshes.remove(&position.chunk());
            }
            removed
        };
        match removed {
            Some(mesh) => {
                unloading.force_queue(mesh);
                true
            }
            None => false,
        }
    }

    /// Adds the meshes that pass the chunk test and then the section test on their
    /// own occupied sub-volume.
    pub fn collect(&self, visibility: &VisibilitySnapshot, out: &mut VisibleMeshes) {
        let meshes = self.meshes.read();
        for (chunk, column) in meshes.iter() {
            if !visibility.is_chunk_visible(*chunk) {
                continue;
            }
            for (height, mesh) in column {
                if visibility.is_section_visible(*chunk, *height, mesh.min, mesh.max, false) {
                    out.add(mesh);
                }
            }
        }
    }

    pub fn contains(&self, chunk: ChunkPosition) -> bool {
        self.meshes.read().contains_key(&chunk)
    }

    pub fn contains_section(&self, position: SectionPosition) -> bool {
        self.meshes
            .read()
            .get(&position.chunk())
            .is_some_and(|c| c.contains_key(&position.y))
    }

    pub fn state_of(&self, position: SectionPosition) -> Option<MeshState> {
        self.meshes
            .read()
            .get(&position.chunk())
            .and_then(|c| c.get(&position.y))
            .map(SectionMeshes::state)
    }

    /// Number of columns with at least one mesh.
    pub fn len(&self) -> usize {
        self.meshes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn section_count(&self) -> usize {
        self.meshes.read().values().map(HashMap::len).sum()
    }

    pub fn chunks(&self) -> Vec<ChunkPosition> {
        self.meshes.read().keys().copied().collect()
    }
}
