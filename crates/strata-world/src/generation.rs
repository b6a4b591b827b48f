use fastnoise_lite::{FastNoiseLite, NoiseType};
use serde::Deserialize;
use strata_blocks::{Block, BlockRegistry};

use crate::position::{ChunkPosition, SECTION_SIZE};
use crate::section::{SECTION_VOLUME, Section};
use crate::world::Dimension;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub height_frequency: f32,
    pub base_height: i32,
    pub amplitude: f32,
    pub sea_level: i32,
    pub topsoil_thickness: i32,
    pub top: String,
    pub soil: String,
    pub deep: String,
    pub fluid: String,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            height_frequency: 0.01,
            base_height: 48,
            amplitude: 24.0,
            sea_level: 44,
            topsoil_thickness: 3,
            top: "grass".into(),
            soil: "dirt".into(),
            deep: "stone".into(),
            fluid: "water".into(),
        }
    }
}

/// Heightmap terrain with a flat sea, one column at a time.
pub struct TerrainGenerator {
    noise: FastNoiseLite,
    params: TerrainParams,
    top: Block,
    soil: Block,
    deep: Block,
    fluid: Block,
}

impl TerrainGenerator {
    pub fn new(seed: i32, params: TerrainParams, registry: &BlockRegistry) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(params.height_frequency));
        let pick = |name: &str| {
            registry.make_block_by_name(name).unwrap_or_else(|| {
                log::warn!("terrain block `{name}` is not registered; using air");
                Block::AIR
            })
        };
        Self {
            noise,
            top: pick(&params.top),
            soil: pick(&params.soil),
            deep: pick(&params.deep),
            fluid: pick(&params.fluid),
            params,
        }
    }

    #[inline]
    pub fn surface_height(&self, wx: i32, wz: i32) -> i32 {
        let h = self.noise.get_noise_2d(wx as f32, wz as f32);
        self.params.base_height + (h * self.params.amplitude) as i32
    }

    pub fn generate_column(
        &self,
        pos: ChunkPosition,
        dimension: Dimension,
        registry: &BlockRegistry,
    ) -> Vec<Option<Section>> {
        let size = SECTION_SIZE as usize;
        let mut heights = vec![0i32; size * size];
        for z in 0..size {
            for x in 0..size {
                let wx = pos.x * SECTION_SIZE + x as i32;
                let wz = pos.z * SECTION_SIZE + z as i32;
                heights[z * size + x] = self.surface_height(wx, wz);
            }
        }
        let mut out = Vec::with_capacity(dimension.sections as usize);
        for i in 0..dimension.sections as i32 {
            let base_y = (dimension.min_section + i) * SECTION_SIZE;
            let mut blocks = vec![Block::AIR; SECTION_VOLUME];
            let mut any = false;
            for y in 0..size {
                let wy = base_y + y as i32;
                for z in 0..size {
                    for x in 0..size {
                        let h = heights[z * size + x];
                        let b = if wy > h {
                            if wy <= self.params.sea_level {
                                self.fluid
                            } else {
                                continue;
                            }
                        } else if wy == h {
                            if h < self.params.sea_level { self.soil } else { self.top }
                        } else if wy > h - self.params.topsoil_thickness {
                            self.soil
                        } else {
                            self.deep
                        };
                        if !b.is_air() {
                            blocks[(y << 8) | (z << 4) | x] = b;
                            any = true;
                        }
                    }
                }
            }
            out.push(any.then(|| Section::from_blocks(blocks, registry)));
        }
        out
    }
}
