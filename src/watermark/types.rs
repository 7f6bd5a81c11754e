use image::ImageFormat;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;

use super::error::ConfigError;

/// Corner of the surface a watermark layer is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnchorCorner {
    TopLeft,
    TopRight,
    #[default]
    BottomLeft,
    BottomRight,
}

impl AnchorCorner {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorCorner::TopLeft => "top-left",
            AnchorCorner::TopRight => "top-right",
            AnchorCorner::BottomLeft => "bottom-left",
            AnchorCorner::BottomRight => "bottom-right",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top-left" => Some(AnchorCorner::TopLeft),
            "top-right" => Some(AnchorCorner::TopRight),
            "bottom-left" => Some(AnchorCorner::BottomLeft),
            "bottom-right" => Some(AnchorCorner::BottomRight),
            _ => None,
        }
    }

    /// Unrecognized names land on bottom-left.
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }

    /// Top-left origin of an `item_width` x `item_height` box pinned to this
    /// corner, `padding` pixels in from both edges.
    ///
    /// No clamping is applied: an item larger than the surface yields a
    /// negative or partially off-surface origin.
    pub fn origin(
        &self,
        surface_width: u32,
        surface_height: u32,
        item_width: u32,
        item_height: u32,
        padding: u32,
    ) -> Placement {
        let right = surface_width as i64 - item_width as i64 - padding as i64;
        let bottom = surface_height as i64 - item_height as i64 - padding as i64;
        let near = padding as i64;

        match self {
            AnchorCorner::TopLeft => Placement::new(near, near),
            AnchorCorner::TopRight => Placement::new(right, near),
            AnchorCorner::BottomLeft => Placement::new(near, bottom),
            AnchorCorner::BottomRight => Placement::new(right, bottom),
        }
    }
}

impl fmt::Display for AnchorCorner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AnchorCorner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AnchorCorner {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(AnchorCorner::parse_or_default(&value))
    }
}

/// Signed pixel position of a layer's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
}

impl Placement {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i64, dy: i64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Opaque three-channel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, 255])
    }

    /// Parse `#RGB` or `#RRGGBB`.
    pub fn from_hex(value: &str) -> Result<Self, ConfigError> {
        let invalid = |reason| ConfigError::InvalidColor {
            value: value.to_string(),
            reason,
        };

        let hex = value
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| invalid("color must start with '#'"))?;

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("invalid hex digit"));
        }

        let channel =
            |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid("invalid hex digit"));

        match hex.len() {
            3 => Ok(Rgb::new(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
            )),
            6 => Ok(Rgb::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => Err(invalid("expected #RGB or #RRGGBB")),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Rgb::from_hex(&value).map_err(serde::de::Error::custom)
    }
}

/// Rendered extent of a string in a particular font resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBoundingBox {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
    Rgb,
    Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Bmp,
    Tiff,
    WebP,
}

impl OutputFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "bmp" => Some(OutputFormat::Bmp),
            "tif" | "tiff" => Some(OutputFormat::Tiff),
            "webp" => Some(OutputFormat::WebP),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tiff => "tiff",
            OutputFormat::WebP => "webp",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::Tiff => ImageFormat::Tiff,
            OutputFormat::WebP => ImageFormat::WebP,
        }
    }

    /// JPEG has no alpha channel; everything else keeps RGBA.
    pub fn color_model(&self) -> ColorModel {
        match self {
            OutputFormat::Jpeg => ColorModel::Rgb,
            _ => ColorModel::Rgba,
        }
    }
}
