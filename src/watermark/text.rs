use image::RgbaImage;

use super::font::FontResource;
use super::types::{Placement, Rgb};

/// Colors and outline thickness for a text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub fill: Rgb,
    pub outline: Rgb,
    pub outline_width: u32,
}

/// Draw `text` at `origin`, outline first and fill last.
///
/// The outline is the text stamped at every offset of the full
/// `(2w+1) x (2w+1)` square around the origin except the center, so corners
/// come out square rather than round. The fill pass goes on top, so no
/// outline pixel ever covers it. Colors are opaque and replace what is under
/// them rather than blending with the surface's alpha.
pub fn render_text(
    canvas: &mut RgbaImage,
    text: &str,
    font: &FontResource,
    origin: Placement,
    style: &TextStyle,
) {
    let width = style.outline_width as i64;
    if width > 0 {
        let outline = style.outline.to_rgba();
        for dx in -width..=width {
            for dy in -width..=width {
                if dx == 0 && dy == 0 {
                    continue;
                }
                font.draw(canvas, text, origin.offset(dx, dy), outline);
            }
        }
    }

    font.draw(canvas, text, origin, style.fill.to_rgba());
}
