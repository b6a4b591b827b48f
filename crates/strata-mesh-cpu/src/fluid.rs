use strata_blocks::types::fluid_height;
use strata_blocks::{Block, BlockRegistry};
use strata_geom::Vec3;
use strata_world::{Direction, InSectionPosition};

use crate::face::shade;
use crate::mesh::SectionMeshes;
use crate::neighbors::NeighborSnapshot;
use crate::{MeshError, SectionMesher, shaded};

/// Fluid surfaces. Cells under the same fluid are full height; others use their level.
#[derive(Default, Clone, Copy, Debug)]
pub struct FluidMesher;

impl FluidMesher {
    #[inline]
    fn height(snapshot: &NeighborSnapshot, here: Block, x: i32, y: i32, z: i32) -> f32 {
        if snapshot.step(x, y, z, Direction::Up).id == here.id {
            1.0
        } else {
            fluid_height(here.state)
        }
    }
}

impl SectionMesher for FluidMesher {
    fn name(&self) -> &'static str {
        "fluid"
    }

    fn applies(&self, snapshot: &NeighborSnapshot) -> bool {
        snapshot.center.has_fluid()
    }

    fn mesh(
        &self,
        snapshot: &NeighborSnapshot,
        registry: &BlockRegistry,
        out: &mut SectionMeshes,
    ) -> Result<(), MeshError> {
        let Some(build) = out.translucent.as_mut() else {
            return Ok(());
        };
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
                    if !ty.is_fluid() {
                        continue;
                    }
                    let (ix, iy, iz) = (x as i32, y as i32, z as i32);
                    let h = Self::height(snapshot, here, ix, iy, iz);
                    let cell = origin + Vec3::new(x as f32, y as f32, z as f32);
                    for dir in Direction::ALL {
                        let neighbour = snapshot.step(ix, iy, iz, dir);
                        if neighbour.id == here.id || registry.is_opaque(neighbour) {
                            continue;
                        }
                        let color = shaded(ty.color, shade(dir));
                        match dir {
                            Direction::Up => {
                                let o = Vec3::new(cell.x, cell.y + h, cell.z);
                                build.add_face_rect(dir, o, 1.0, 1.0, color);
                            }
                            Direction::Down => build.add_face_rect(dir, cell, 1.0, 1.0, color),
                            Direction::East => {
                                build.add_face_rect(dir, Vec3::new(cell.x + 1.0, cell.y, cell.z), 1.0, h, color)
                            }
                            Direction::South => {
                                build.add_face_rect(dir, Vec3::new(cell.x, cell.y, cell.z + 1.0), 1.0, h, color)
                            }
                            Direction::West | Direction::North => build.add_face_rect(dir, cell, 1.0, h, color),
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
