use image::{DynamicImage, RgbImage, RgbaImage};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::config::{OverlayImage, OverlayLayer, TextLayer, WatermarkConfig};
use super::error::WatermarkError;
use super::font::FontResolver;
use super::layout::layout_text;
use super::overlay::composite_overlay;
use super::text::{TextStyle, render_text};
use super::types::ColorModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Overlay,
    Text,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStep::Overlay => f.write_str("overlay"),
            PipelineStep::Text => f.write_str("text"),
        }
    }
}

/// A step that failed without stopping the pipeline.
#[derive(Debug)]
pub struct StepDiagnostic {
    pub step: PipelineStep,
    pub error: WatermarkError,
}

impl fmt::Display for StepDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} step skipped: {}", self.step, self.error)
    }
}

/// The watermarked image plus whatever went wrong along the way.
#[derive(Debug)]
pub struct WatermarkOutcome {
    pub image: DynamicImage,
    pub diagnostics: Vec<StepDiagnostic>,
}

impl WatermarkOutcome {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[derive(Clone)]
pub struct WatermarkPipeline {
    fonts: Arc<FontResolver>,
}

impl Default for WatermarkPipeline {
    fn default() -> Self {
        Self::new(FontResolver::global())
    }
}

impl WatermarkPipeline {
    pub fn new(fonts: Arc<FontResolver>) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &Arc<FontResolver> {
        &self.fonts
    }

    /// Apply `config` to `base` and convert the result to `target`.
    ///
    /// The overlay and text steps are best-effort: a failure in either is
    /// recorded as a diagnostic and the image continues as it was before
    /// that step. Only the final color conversion can fail the call.
    pub fn apply(
        &self,
        base: DynamicImage,
        config: &WatermarkConfig,
        target: ColorModel,
    ) -> Result<WatermarkOutcome, WatermarkError> {
        let mut surface = base.into_rgba8();
        let mut diagnostics = Vec::new();

        if let Some(overlay) = &config.overlay {
            match apply_overlay(&surface, overlay) {
                Ok(composited) => surface = composited,
                Err(error) => diagnostics.push(StepDiagnostic {
                    step: PipelineStep::Overlay,
                    error,
                }),
            }
        }

        if let Some(text) = &config.text
            && let Err(error) = self.apply_text(&mut surface, text)
        {
            diagnostics.push(StepDiagnostic {
                step: PipelineStep::Text,
                error,
            });
        }

        for diagnostic in &diagnostics {
            warn!("{}", diagnostic);
        }

        let image = finalize(surface, target)?;
        Ok(WatermarkOutcome { image, diagnostics })
    }

    fn apply_text(&self, surface: &mut RgbaImage, layer: &TextLayer) -> Result<(), WatermarkError> {
        let text = layer.text.trim();
        if text.is_empty() {
            debug!("Text layer is blank, skipping");
            return Ok(());
        }

        let font = self.fonts.resolve(&layer.font_family, layer.font_size);
        let layout = layout_text(
            text,
            &font,
            layer.anchor,
            layer.padding,
            surface.width(),
            surface.height(),
        )?;

        debug!(
            "Drawing {:?} at ({}, {}) with {}x{} bounds",
            text, layout.origin.x, layout.origin.y, layout.bounds.width, layout.bounds.height
        );

        let style = TextStyle {
            fill: layer.color,
            outline: layer.outline_color,
            outline_width: layer.outline_width,
        };
        render_text(surface, text, &font, layout.origin, &style);
        Ok(())
    }
}

fn apply_overlay(surface: &RgbaImage, layer: &OverlayLayer) -> Result<RgbaImage, WatermarkError> {
    match &layer.image {
        OverlayImage::Loaded(overlay) => Ok(composite_overlay(
            surface,
            overlay,
            layer.scale,
            layer.anchor,
            layer.padding,
        )),
        OverlayImage::Unavailable { path, reason } => Err(WatermarkError::OverlayLoadFailure {
            path: path.clone(),
            reason: reason.clone(),
        }),
    }
}

/// Convert the working RGBA surface to the color model the output needs.
pub fn finalize(surface: RgbaImage, target: ColorModel) -> Result<DynamicImage, WatermarkError> {
    match target {
        ColorModel::Rgba => Ok(DynamicImage::ImageRgba8(surface)),
        ColorModel::Rgb => flatten_onto_white(&surface).map(DynamicImage::ImageRgb8),
    }
}

/// Drop alpha by blending every pixel over opaque white.
pub fn flatten_onto_white(surface: &RgbaImage) -> Result<RgbImage, WatermarkError> {
    let (width, height) = surface.dimensions();
    let mut raw = Vec::with_capacity(width as usize * height as usize * 3);

    for pixel in surface.pixels() {
        let alpha = pixel[3] as u32;
        for channel in &pixel.0[..3] {
            let value = (*channel as u32 * alpha + 255 * (255 - alpha) + 127) / 255;
            raw.push(value as u8);
        }
    }

    RgbImage::from_raw(width, height, raw).ok_or(
        WatermarkError::UnsupportedColorModelConversion {
            width,
            height,
            target: "RGB",
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_flatten_onto_white() {
        let mut surface = RgbaImage::new(3, 1);
        surface.put_pixel(0, 0, Rgba([10, 20, 30, 255]));
        surface.put_pixel(1, 0, Rgba([10, 20, 30, 0]));
        surface.put_pixel(2, 0, Rgba([0, 0, 0, 128]));

        let flat = flatten_onto_white(&surface).unwrap();
        assert_eq!(flat.get_pixel(0, 0).0, [10, 20, 30]);
        assert_eq!(flat.get_pixel(1, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(2, 0).0, [127, 127, 127]);
    }

    #[test]
    fn test_finalize_keeps_rgba() {
        let surface = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4]));
        let image = finalize(surface.clone(), ColorModel::Rgba).unwrap();
        assert_eq!(image.as_rgba8(), Some(&surface));
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = StepDiagnostic {
            step: PipelineStep::Overlay,
            error: WatermarkError::OverlayLoadFailure {
                path: "logo.png".into(),
                reason: "file not found".to_string(),
            },
        };
        assert_eq!(
            diagnostic.to_string(),
            "overlay step skipped: Failed to load overlay image \"logo.png\": file not found"
        );
    }
}
