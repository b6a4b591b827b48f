use std::path::{Path, PathBuf};

use serde::Deserialize;
use strata_runtime::{ConfigError, RendererConfig};
use strata_world::{Dimension, TerrainParams};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error(transparent)]
    Renderer(#[from] ConfigError),
}

/// Contents of `strata.toml`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub renderer: RendererConfig,
    pub world: WorldSettings,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub seed: i32,
    /// Columns generated in each direction around the origin.
    pub radius: i32,
    pub blocks: PathBuf,
    pub dimension: Dimension,
    pub terrain: TerrainParams,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            seed: 1337,
            radius: 12,
            blocks: PathBuf::from("assets/blocks.toml"),
            dimension: Dimension::default(),
            terrain: TerrainParams::default(),
        }
    }
}

impl Settings {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("{} not found, using default settings", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let settings: Settings = toml::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.renderer.validate()?;
        Ok(settings)
    }
}
