//! Logo overlay compositing.
//!
//! The overlay is scaled to a fraction of the base width (height follows the
//! overlay's own aspect ratio), pasted onto a transparent layer the size of
//! the base, and that layer is alpha-composited over a copy of the base.

use image::{Rgba, RgbaImage, imageops, imageops::FilterType};
use tracing::debug;

use super::types::{AnchorCorner, Placement};

/// Resolved size and position of an overlay on a particular base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayPlacement {
    pub width: u32,
    pub height: u32,
    pub origin: Placement,
}

/// Target overlay size: width is `round(base_width * scale)`, height is
/// derived from the overlay's aspect ratio. Both are at least one pixel.
pub fn overlay_size(
    base_width: u32,
    overlay_width: u32,
    overlay_height: u32,
    scale: f32,
) -> (u32, u32) {
    let width = (base_width as f64 * scale as f64).round().max(1.0);
    let height = (width * overlay_height as f64 / overlay_width.max(1) as f64)
        .round()
        .max(1.0);
    (width as u32, height as u32)
}

pub fn plan_overlay(
    base_width: u32,
    base_height: u32,
    overlay_width: u32,
    overlay_height: u32,
    scale: f32,
    anchor: AnchorCorner,
    padding: u32,
) -> OverlayPlacement {
    let (width, height) = overlay_size(base_width, overlay_width, overlay_height, scale);
    let origin = anchor.origin(base_width, base_height, width, height, padding);
    OverlayPlacement {
        width,
        height,
        origin,
    }
}

/// Composite `overlay` onto a copy of `base`. `base` is left untouched.
pub fn composite_overlay(
    base: &RgbaImage,
    overlay: &RgbaImage,
    scale: f32,
    anchor: AnchorCorner,
    padding: u32,
) -> RgbaImage {
    if overlay.width() == 0 || overlay.height() == 0 {
        debug!("Overlay image is empty, nothing to composite");
        return base.clone();
    }

    let placement = plan_overlay(
        base.width(),
        base.height(),
        overlay.width(),
        overlay.height(),
        scale,
        anchor,
        padding,
    );

    let resized = if (placement.width, placement.height) == overlay.dimensions() {
        overlay.clone()
    } else {
        imageops::resize(overlay, placement.width, placement.height, FilterType::Lanczos3)
    };

    debug!(
        "Placing {}x{} overlay at ({}, {}) on {}x{} base",
        placement.width,
        placement.height,
        placement.origin.x,
        placement.origin.y,
        base.width(),
        base.height()
    );

    // Pixels the overlay leaves transparent stay fully transparent on the
    // layer and so never touch the base.
    let mut layer = RgbaImage::new(base.width(), base.height());
    imageops::replace(&mut layer, &resized, placement.origin.x, placement.origin.y);

    let mut output = base.clone();
    alpha_composite(&mut output, &layer);
    output
}

/// Porter-Duff "over" of `top` onto `bottom`, which must be the same size.
pub fn alpha_composite(bottom: &mut RgbaImage, top: &RgbaImage) {
    for (dst, src) in bottom.pixels_mut().zip(top.pixels()) {
        *dst = blend_over(*dst, *src);
    }
}

/// Straight-alpha "over": `fg` on top of `bg`.
pub fn blend_over(bg: Rgba<u8>, fg: Rgba<u8>) -> Rgba<u8> {
    match fg[3] {
        0 => return bg,
        255 => return fg,
        _ => {}
    }

    let fg_alpha = fg[3] as f32 / 255.0;
    let bg_alpha = bg[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    let channel = |f: u8, b: u8| -> u8 {
        let value = (f as f32 * fg_alpha + b as f32 * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        value.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(fg[0], bg[0]),
        channel(fg[1], bg[1]),
        channel(fg[2], bg[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
