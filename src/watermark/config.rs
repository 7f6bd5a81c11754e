use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::error::ConfigError;
use super::types::{AnchorCorner, Rgb};

/// Largest text size accepted in configuration, in pixels.
pub const MAX_FONT_SIZE: u32 = 4096;

/// A decoded overlay, or the reason it could not be decoded.
///
/// Loading happens before the pipeline runs; a failed load is carried in as
/// data so the pipeline can report it and carry on with the text layer.
#[derive(Debug, Clone)]
pub enum OverlayImage {
    Loaded(Arc<RgbaImage>),
    Unavailable { path: PathBuf, reason: String },
}

impl OverlayImage {
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return OverlayImage::Unavailable {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            };
        }

        match image::open(path) {
            Ok(img) => {
                debug!(
                    "Loaded overlay {:?} ({}x{})",
                    path,
                    img.width(),
                    img.height()
                );
                OverlayImage::Loaded(Arc::new(img.to_rgba8()))
            }
            Err(e) => OverlayImage::Unavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        OverlayImage::Loaded(Arc::new(image))
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, OverlayImage::Loaded(_))
    }
}

#[derive(Debug, Clone)]
pub struct OverlayLayer {
    pub image: OverlayImage,
    /// Overlay width as a fraction of the base width.
    pub scale: f32,
    pub anchor: AnchorCorner,
    pub padding: u32,
}

impl OverlayLayer {
    pub fn new(
        image: OverlayImage,
        scale: f32,
        anchor: AnchorCorner,
        padding: u32,
    ) -> Result<Self, ConfigError> {
        let layer = Self {
            image,
            scale,
            anchor,
            padding,
        };
        layer.validate()?;
        Ok(layer)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ConfigError::InvalidScale(self.scale));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    pub text: String,
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: u32,
    pub color: Rgb,
    pub outline_color: Rgb,
    /// Outline thickness in pixels; zero disables the outline.
    pub outline_width: u32,
    pub anchor: AnchorCorner,
    pub padding: u32,
}

impl TextLayer {
    pub fn new(text: impl Into<String>) -> Self {
        let defaults = TextSettings::default();
        Self {
            text: text.into(),
            font_family: defaults.font_family,
            font_size: defaults.font_size,
            color: defaults.color,
            outline_color: defaults.outline_color,
            outline_width: defaults.outline_width,
            anchor: defaults.anchor,
            padding: defaults.padding,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.font_size == 0 {
            return Err(ConfigError::InvalidFontSize);
        }
        if self.font_size > MAX_FONT_SIZE {
            return Err(ConfigError::FontSizeTooLarge(self.font_size));
        }
        Ok(())
    }

    /// Font size that reads well on a `width` x `height` image: 5% of the
    /// shorter side.
    pub fn recommended_font_size(width: u32, height: u32) -> u32 {
        (width.min(height) as f64 * 0.05) as u32
    }

    /// Edge distance that suits a `width` x `height` image: 2% of the
    /// shorter side.
    pub fn recommended_padding(width: u32, height: u32) -> u32 {
        (width.min(height) as f64 * 0.02) as u32
    }
}

/// Everything applied to one image. Either layer may be absent.
#[derive(Debug, Clone, Default)]
pub struct WatermarkConfig {
    pub overlay: Option<OverlayLayer>,
    pub text: Option<TextLayer>,
}

impl WatermarkConfig {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_overlay(mut self, overlay: OverlayLayer) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn with_text(mut self, text: TextLayer) -> Self {
        self.text = Some(text);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(overlay) = &self.overlay {
            overlay.validate()?;
        }
        if let Some(text) = &self.text {
            text.validate()?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.overlay.is_none() && self.text.is_none()
    }
}

/// `[overlay]` section of the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverlaySettings {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_overlay_scale")]
    pub scale: f32,
    #[serde(default = "default_overlay_anchor")]
    pub anchor: AnchorCorner,
    #[serde(default = "default_overlay_padding")]
    pub padding: u32,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            path: None,
            scale: default_overlay_scale(),
            anchor: default_overlay_anchor(),
            padding: default_overlay_padding(),
        }
    }
}

impl OverlaySettings {
    pub fn layer(&self, image: OverlayImage) -> Result<OverlayLayer, ConfigError> {
        OverlayLayer::new(image, self.scale, self.anchor, self.padding)
    }
}

fn default_overlay_scale() -> f32 {
    0.18
}

fn default_overlay_anchor() -> AnchorCorner {
    AnchorCorner::BottomRight
}

fn default_overlay_padding() -> u32 {
    300
}

/// `[text]` section of the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextSettings {
    /// Used for images that have no sidecar text file.
    #[serde(default)]
    pub default_text: Option<String>,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_text_color")]
    pub color: Rgb,
    #[serde(default = "default_outline_color")]
    pub outline_color: Rgb,
    #[serde(default = "default_outline_width")]
    pub outline_width: u32,
    #[serde(default)]
    pub anchor: AnchorCorner,
    #[serde(default = "default_text_padding")]
    pub padding: u32,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            default_text: None,
            font_family: default_font_family(),
            font_size: default_font_size(),
            color: default_text_color(),
            outline_color: default_outline_color(),
            outline_width: default_outline_width(),
            anchor: AnchorCorner::BottomLeft,
            padding: default_text_padding(),
        }
    }
}

impl TextSettings {
    pub fn layer(&self, text: impl Into<String>) -> Result<TextLayer, ConfigError> {
        let layer = TextLayer {
            text: text.into(),
            font_family: self.font_family.clone(),
            font_size: self.font_size,
            color: self.color,
            outline_color: self.outline_color,
            outline_width: self.outline_width,
            anchor: self.anchor,
            padding: self.padding,
        };
        layer.validate()?;
        Ok(layer)
    }
}

fn default_font_family() -> String {
    "Times New Roman".to_string()
}

fn default_font_size() -> u32 {
    40
}

fn default_text_color() -> Rgb {
    Rgb::WHITE
}

fn default_outline_color() -> Rgb {
    Rgb::BLACK
}

fn default_outline_width() -> u32 {
    2
}

fn default_text_padding() -> u32 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_scale_validation() {
        let image = OverlayImage::from_image(RgbaImage::new(4, 4));
        assert!(OverlayLayer::new(image.clone(), 0.2, AnchorCorner::TopLeft, 0).is_ok());
        for bad in [0.0, -0.5, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                OverlayLayer::new(image.clone(), bad, AnchorCorner::TopLeft, 0),
                Err(ConfigError::InvalidScale(_))
            ));
        }
    }

    #[test]
    fn test_text_defaults() {
        let layer = TextLayer::new("PROOF");
        assert_eq!(layer.font_family, "Times New Roman");
        assert_eq!(layer.font_size, 40);
        assert_eq!(layer.color, Rgb::WHITE);
        assert_eq!(layer.outline_color, Rgb::BLACK);
        assert_eq!(layer.outline_width, 2);
        assert_eq!(layer.anchor, AnchorCorner::BottomLeft);
        assert_eq!(layer.padding, 20);
    }

    #[test]
    fn test_zero_font_size_rejected() {
        let settings = TextSettings {
            font_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.layer("x"),
            Err(ConfigError::InvalidFontSize)
        ));
    }

    #[test]
    fn test_oversized_font_rejected() {
        let at_limit = TextSettings {
            font_size: MAX_FONT_SIZE,
            ..Default::default()
        };
        assert!(at_limit.layer("x").is_ok());

        let too_big = TextSettings {
            font_size: 2_000_000,
            ..Default::default()
        };
        assert!(matches!(
            too_big.layer("x"),
            Err(ConfigError::FontSizeTooLarge(2_000_000))
        ));
    }

    #[test]
    fn test_recommendations() {
        assert_eq!(TextLayer::recommended_font_size(1000, 800), 40);
        assert_eq!(TextLayer::recommended_padding(1000, 800), 16);
        assert_eq!(TextLayer::recommended_font_size(10, 10), 0);
    }

    #[test]
    fn test_missing_overlay_file() {
        let overlay = OverlayImage::load(Path::new("/no/such/logo.png"));
        assert!(!overlay.is_loaded());
        match overlay {
            OverlayImage::Unavailable { path, reason } => {
                assert_eq!(path, PathBuf::from("/no/such/logo.png"));
                assert_eq!(reason, "file not found");
            }
            OverlayImage::Loaded(_) => panic!("expected unavailable overlay"),
        }
    }

    #[test]
    fn test_corrupt_overlay_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(!OverlayImage::load(&path).is_loaded());
    }

    #[test]
    fn test_settings_from_toml() {
        let settings: TextSettings = toml_edit::de::from_str(
            r##"
            font_family = "Inter"
            color = "#FF0000"
            anchor = "somewhere"
            "##,
        )
        .unwrap();
        assert_eq!(settings.font_family, "Inter");
        assert_eq!(settings.color, Rgb::new(255, 0, 0));
        assert_eq!(settings.anchor, AnchorCorner::BottomLeft);
        assert_eq!(settings.font_size, 40);

        let overlay: OverlaySettings = toml_edit::de::from_str("scale = 0.25").unwrap();
        assert_eq!(overlay.scale, 0.25);
        assert_eq!(overlay.anchor, AnchorCorner::BottomRight);
        assert_eq!(overlay.padding, 300);
    }
}
