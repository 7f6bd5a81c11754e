use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatermarkError {
    #[error("Failed to load overlay image {path:?}: {reason}")]
    OverlayLoadFailure { path: PathBuf, reason: String },

    #[error("Failed to measure text {text:?}: {reason}")]
    TextMeasurementFailure { text: String, reason: String },

    #[error("Cannot convert {width}x{height} surface to {target}")]
    UnsupportedColorModelConversion {
        width: u32,
        height: u32,
        target: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Overlay scale must be a finite number greater than zero, got {0}")]
    InvalidScale(f32),

    #[error("Font size must be greater than zero")]
    InvalidFontSize,

    #[error("Font size {0} exceeds the maximum of {max}", max = crate::watermark::config::MAX_FONT_SIZE)]
    FontSizeTooLarge(u32),

    #[error("Invalid color {value:?}: {reason}")]
    InvalidColor { value: String, reason: &'static str },
}
