use super::error::WatermarkError;
use super::font::FontResource;
use super::types::{AnchorCorner, Placement, TextBoundingBox};

/// Where to draw a text layer, together with the measured box it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLayout {
    pub origin: Placement,
    pub bounds: TextBoundingBox,
}

/// Measure `text` in `font` and pin its bounding box to `anchor`.
///
/// The origin is the top-left of the text's bounding box. It is not clamped,
/// so text wider or taller than the surface starts off-surface.
pub fn layout_text(
    text: &str,
    font: &FontResource,
    anchor: AnchorCorner,
    padding: u32,
    surface_width: u32,
    surface_height: u32,
) -> Result<TextLayout, WatermarkError> {
    let bounds = font.measure(text)?;
    let origin = anchor.origin(
        surface_width,
        surface_height,
        bounds.width,
        bounds.height,
        padding,
    );
    Ok(TextLayout { origin, bounds })
}
