use std::sync::Arc;

use rayon::prelude::*;
use strata_blocks::BlockRegistry;
use strata_geom::{Frustum, Vec3};
use strata_world::{BlockPosition, ChunkPosition, SECTION_SIZE, SectionPosition, SharedWorld, TerrainGenerator, World, WorldError};

use crate::settings::WorldSettings;

/// Generates every column within `radius` of the origin. Columns are built in
/// parallel and inserted in a fixed order so neighbour links come out the same
/// on every run.
pub fn generate(registry: Arc<BlockRegistry>, settings: &WorldSettings) -> Result<(SharedWorld, TerrainGenerator), WorldError> {
    let terrain = TerrainGenerator::new(settings.seed, settings.terrain.clone(), &registry);
    let dimension = settings.dimension;
    let r = settings.radius;
    let positions: Vec<ChunkPosition> = (-r..=r)
        .flat_map(|x| (-r..=r).map(move |z| ChunkPosition::new(x, z)))
        .collect();
    let columns: Vec<_> = positions
        .par_iter()
        .map(|&pos| (pos, terrain.generate_column(pos, dimension, &registry)))
        .collect();
    let mut world = World::new(dimension, registry);
    for (pos, sections) in columns {
        world.insert_column(pos, sections)?;
    }
    log::info!("generated {} columns (seed {})", world.column_count(), settings.seed);
    Ok((world.into_shared(), terrain))
}

/// A camera gliding back and forth along the x axis above the terrain.
pub struct Flight {
    pub eye: Vec3,
    heading: f32,
    limit: f32,
}

impl Flight {
    pub fn new(terrain: &TerrainGenerator, radius: i32) -> Self {
        let ground = terrain.surface_height(0, 0);
        Self {
            eye: Vec3::new(0.5, ground as f32 + 24.5, 0.5),
            heading: 1.0,
            limit: ((radius - 1).max(0) * SECTION_SIZE) as f32,
        }
    }

    pub fn advance(&mut self, speed: f32) {
        self.eye.x += speed * self.heading;
        if self.eye.x.abs() >= self.limit {
            self.eye.x = self.eye.x.clamp(-self.limit, self.limit);
            self.heading = -self.heading;
        }
    }

    pub fn section(&self) -> SectionPosition {
        BlockPosition::containing(self.eye).section()
    }

    /// Looking ahead and slightly down, far plane just past the view distance.
    pub fn frustum(&self, view_distance: i32) -> Frustum {
        let forward = Vec3::new(self.heading, -0.35, 0.0);
        let far = ((view_distance + 1) * SECTION_SIZE) as f32 * 1.5;
        Frustum::perspective(self.eye, forward, Vec3::UP, 70f32.to_radians(), 16.0 / 9.0, 0.1, far)
    }
}
