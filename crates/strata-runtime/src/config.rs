use std::path::Path;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read renderer config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse renderer config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid renderer config: {0}")]
    Invalid(String),
}

/// Tunables of the section renderer, usually the `[renderer]` table of `strata.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub occlusion_culling: bool,
    /// Radius in columns around the camera column.
    pub view_distance: i32,
    /// `None` picks one less than the available cores; `Some(0)` meshes inline on the render thread.
    pub worker_threads: Option<usize>,
    pub max_uploads_per_frame: usize,
    pub max_unloads_per_frame: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            occlusion_culling: true,
            view_distance: 8,
            worker_threads: None,
            max_uploads_per_frame: 32,
            max_unloads_per_frame: 64,
        }
    }
}

impl RendererConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let cfg: RendererConfig = toml::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path)?;
        Self::from_toml_str(&src)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.view_distance < 0 {
            return Err(ConfigError::Invalid(format!(
                "view_distance must not be negative (got {})",
                self.view_distance
            )));
        }
        if self.max_uploads_per_frame == 0 {
            return Err(ConfigError::Invalid("max_uploads_per_frame must be at least 1".into()));
        }
        if self.max_unloads_per_frame == 0 {
            return Err(ConfigError::Invalid("max_unloads_per_frame must be at least 1".into()));
        }
        Ok(())
    }

    /// Meshing threads for a machine with `available` cores. Zero means inline meshing.
    pub fn worker_count(&self, available: usize) -> usize {
        let spare = available.saturating_sub(1);
        match self.worker_threads {
            Some(0) => 0,
            Some(n) => n.min(spare).max(1),
            None => spare.max(1),
        }
    }
}
