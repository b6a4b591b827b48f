use strata_blocks::{BlockRegistry, RenderKind};
use strata_geom::Vec3;
use strata_world::{Direction, InSectionPosition};

use crate::face::{face_origin, shade};
use crate::mesh::SectionMeshes;
use crate::neighbors::NeighborSnapshot;
use crate::{MeshError, SectionMesher, shaded};

/// Cube faces of every non-fluid block, culled against the neighbour that hides them.
#[derive(Default, Clone, Copy, Debug)]
pub struct SolidMesher;

impl SectionMesher for SolidMesher {
    fn name(&self) -> &'static str {
        "solid"
    }

    fn mesh(
        &self,
        snapshot: &NeighborSnapshot,
        registry: &BlockRegistry,
        out: &mut SectionMeshes,
    ) -> Result<(), MeshError> {
        let origin = snapshot.position.origin();
        let (lo, hi) = (snapshot.center.min(), snapshot.center.max());
        for y in lo.y..=hi.y {
            for z in lo.z..=hi.z {
                for x in lo.x..=hi.x {
                    let at = InSectionPosition::new(x, y, z);
                    let here = snapshot.center.get(at);
                    if here.is_air() {
                        continue;
                    }
                    let ty = registry.resolve(here.id).ok_or(MeshError::UnknownBlock {
                        section: snapshot.position,
                        at,
                        id: here.id,
                    })?;
                    let target = match ty.kind {
                        RenderKind::Invisible | RenderKind::Fluid => continue,
                        RenderKind::Translucent => &mut out.translucent,
                        RenderKind::Opaque | RenderKind::Cutout => &mut out.opaque,
                    };
                    let Some(build) = target.as_mut() else {
                        continue;
                    };
                    let (ix, iy, iz) = (x as i32, y as i32, z as i32);
                    let cell = origin + Vec3::new(x as f32, y as f32, z as f32);
                    for dir in Direction::ALL {
                        let neighbour = snapshot.step(ix, iy, iz, dir);
                        if registry.occludes_face(here, neighbour) {
                            continue;
                        }
                        build.add_face_rect(dir, face_origin(dir, cell), 1.0, 1.0, shaded(ty.color, shade(dir)));
                    }
                }
            }
        }
        Ok(())
    }
}
