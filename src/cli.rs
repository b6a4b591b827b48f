use std::path::PathBuf;

use clap::Parser;

use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(version, about = "Flies a camera over generated terrain and drives the section meshing pipeline headlessly", long_about = None)]
pub struct Args {
    #[arg(short, long, default_value = "strata.toml")]
    pub config: PathBuf,

    /// Overrides `world.blocks`.
    #[arg(long)]
    pub blocks: Option<PathBuf>,

    #[arg(long)]
    pub seed: Option<i32>,

    /// Columns generated around the origin.
    #[arg(short, long)]
    pub radius: Option<i32>,

    #[arg(short = 'd', long)]
    pub view_distance: Option<i32>,

    /// Meshing threads; 0 meshes on the render thread.
    #[arg(short, long)]
    pub workers: Option<usize>,

    #[arg(long)]
    pub no_occlusion: bool,

    #[arg(short, long, default_value_t = 600)]
    pub frames: u32,

    /// Camera speed in blocks per frame.
    #[arg(long, default_value_t = 0.75)]
    pub speed: f32,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Command line flags win over the settings file.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(blocks) = &self.blocks {
            settings.world.blocks = blocks.clone();
        }
        if let Some(seed) = self.seed {
            settings.world.seed = seed;
        }
        if let Some(radius) = self.radius {
            settings.world.radius = radius.max(1);
        }
        if let Some(vd) = self.view_distance {
            settings.renderer.view_distance = vd;
        }
        if let Some(workers) = self.workers {
            settings.renderer.worker_threads = Some(workers);
        }
        if self.no_occlusion {
            settings.renderer.occlusion_culling = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_settings() {
        let args = Args::parse_from(["strata", "-d", "3", "--workers", "0", "--no-occlusion", "-r", "0"]);
        let mut s = Settings::default();
        args.apply(&mut s);
        assert_eq!(s.renderer.view_distance, 3);
        assert_eq!(s.renderer.worker_threads, Some(0));
        assert!(!s.renderer.occlusion_culling);
        assert_eq!(s.world.radius, 1);
    }
}
