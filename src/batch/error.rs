use std::path::PathBuf;
use thiserror::Error;

use crate::watermark::{ConfigError, WatermarkError};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error(transparent)]
    Watermark(#[from] WatermarkError),

    #[error("Invalid watermark configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Input directory does not exist: {0:?}")]
    InputDirectoryMissing(PathBuf),

    #[error("Unsupported output format: {0:?}")]
    UnsupportedOutputFormat(PathBuf),

    #[error("Worker failed: {0}")]
    Worker(String),
}
