//! Headless flythrough that drives the section visibility and meshing pipeline.
#![forbid(unsafe_code)]

mod cli;
mod scene;
mod settings;

use std::error::Error;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use strata_blocks::BlockRegistry;
use strata_runtime::{HeadlessBackend, MeshOutcome, SectionRenderer};

use crate::cli::Args;
use crate::scene::Flight;
use crate::settings::Settings;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    let mut settings = Settings::load_or_default(&args.config)?;
    args.apply(&mut settings);

    let registry = Arc::new(BlockRegistry::load_from_path(&settings.world.blocks)?);
    let (world, terrain) = scene::generate(registry, &settings.world)?;
    let renderer = SectionRenderer::new(world, settings.renderer.clone())?;
    let mut backend = HeadlessBackend::new();
    let mut flight = Flight::new(&terrain, settings.world.radius);
    let view_distance = settings.renderer.view_distance;

    renderer.start();
    let started = Instant::now();
    let (mut uploaded, mut released, mut drawn) = (0usize, 0usize, 0usize);
    for frame in 0..args.frames {
        renderer.set_frustum(flight.frustum(view_distance));
        renderer.on_camera_moved(flight.section());
        let stats = renderer.frame(&mut backend);
        let list = renderer.draw_list();
        uploaded += stats.uploaded;
        released += stats.released;
        drawn += list.len();
        if frame % 60 == 0 {
            log::info!(
                "frame {frame}: camera {:?}, {} queued, {} loaded, {} drawn ({} quads), {} KiB resident",
                flight.section(),
                stats.queued,
                stats.loaded,
                list.len(),
                list.quads(),
                backend.resident_bytes() / 1024
            );
        }
        flight.advance(args.speed);
    }

    let elapsed = started.elapsed();
    let shared = renderer.shared();
    log::info!(
        "{} frames in {elapsed:?}: {uploaded} uploads, {released} releases, {:.1} draws per frame",
        args.frames,
        drawn as f64 / f64::from(args.frames.max(1))
    );
    log::info!(
        "builds: {} installed, {} requeued, {} discarded, {} unloaded, {} cancelled",
        shared.stats.count(MeshOutcome::Installed),
        shared.stats.count(MeshOutcome::Requeued),
        shared.stats.count(MeshOutcome::Discarded),
        shared.stats.count(MeshOutcome::Unloaded),
        shared.stats.count(MeshOutcome::Cancelled)
    );
    renderer.shutdown(&mut backend);
    Ok(())
}
