//! CPU section meshing: solid and fluid meshers over an immutable neighbour snapshot.
#![forbid(unsafe_code)]

pub mod face;
pub mod fluid;
pub mod mesh;
pub mod mesh_build;
pub mod neighbors;
pub mod solid;

use std::sync::Arc;

use strata_blocks::{BlockId, BlockRegistry};
use strata_world::{InSectionPosition, SectionPosition};

pub use fluid::FluidMesher;
pub use mesh::{MeshHandle, MeshState, SectionMeshes};
pub use mesh_build::MeshBuild;
pub use neighbors::NeighborSnapshot;
pub use solid::SolidMesher;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("unknown block id {id} at {at:?} in section {section:?}")]
    UnknownBlock {
        section: SectionPosition,
        at: InSectionPosition,
        id: BlockId,
    },
}

/// One geometry pass over a section. Implementations only read the snapshot.
pub trait SectionMesher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this pass has anything to do for the section.
    fn applies(&self, _snapshot: &NeighborSnapshot) -> bool {
        true
    }

    fn mesh(
        &self,
        snapshot: &NeighborSnapshot,
        registry: &BlockRegistry,
        out: &mut SectionMeshes,
    ) -> Result<(), MeshError>;
}

#[inline]
pub(crate) fn shaded(rgba: [u8; 4], f: f32) -> [u8; 4] {
    let s = |c: u8| (c as f32 * f).round().clamp(0.0, 255.0) as u8;
    [s(rgba[0]), s(rgba[1]), s(rgba[2]), rgba[3]]
}

/// Runs the configured passes over a section snapshot.
pub struct ChunkMesher {
    registry: Arc<BlockRegistry>,
    passes: Vec<Box<dyn SectionMesher>>,
}

impl ChunkMesher {
    pub fn new(registry: Arc<BlockRegistry>) -> Self {
        Self {
            registry,
            passes: vec![Box::new(SolidMesher), Box::new(FluidMesher)],
        }
    }

    pub fn with_passes(registry: Arc<BlockRegistry>, passes: Vec<Box<dyn SectionMesher>>) -> Self {
        Self { registry, passes }
    }

    #[inline]
    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    /// Builds the section. `Ok(None)` means nothing to draw; the caller unloads instead of caching.
    /// On error the partial geometry is dropped.
    pub fn mesh(&self, snapshot: &NeighborSnapshot) -> Result<Option<SectionMeshes>, MeshError> {
        let section = &snapshot.center;
        if section.is_empty() {
            return Ok(None);
        }
        let mut out = SectionMeshes::new(
            snapshot.position,
            section.min(),
            section.max(),
            section.revision(),
        )
        .with_neighbour_revisions(snapshot.neighbour_revisions());
        for pass in &self.passes {
            if !pass.applies(snapshot) {
                continue;
            }
            pass.mesh(snapshot, &self.registry, &mut out)?;
            log::trace!(target: "meshing", "{} pass on {:?}: {} quads", pass.name(), snapshot.position, out.quad_count());
        }
        if out.clear_empty() == 0 {
            return Ok(None);
        }
        Ok(Some(out))
    }
}
