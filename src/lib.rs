use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub mod batch;
pub mod startup_checks;
pub mod watermark;

use watermark::{FontCatalogConfig, OverlaySettings, TextSettings};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub overlay: OverlaySettings,
    #[serde(default)]
    pub text: TextSettings,
    #[serde(default)]
    pub fonts: FontCatalogConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    #[serde(default = "default_input_directory")]
    pub input_directory: PathBuf,
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
    /// Number of images processed at once. Defaults to the available cores.
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default = "default_sidecar_extension")]
    pub sidecar_extension: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_directory: default_input_directory(),
            output_directory: default_output_directory(),
            workers: None,
            sidecar_extension: default_sidecar_extension(),
        }
    }
}

impl BatchConfig {
    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|n| *n > 0)
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1)
    }
}

fn default_input_directory() -> PathBuf {
    PathBuf::from("input")
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("output")
}

fn default_sidecar_extension() -> String {
    "txt".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

fn default_jpeg_quality() -> u8 {
    95
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml_edit::de::Error,
    },
}

impl Config {
    /// Load `path`, or fall back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml_edit::de::from_str::<Config>(&content).map_err(|source| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
