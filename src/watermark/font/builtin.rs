//! Built-in 5x7 bitmap face.
//!
//! This is the last stop of font resolution and needs no file on disk, so text
//! watermarks always render. Lowercase letters are drawn with the uppercase
//! glyphs and anything outside the table is drawn as `?`.

use image::{Rgba, RgbaImage};

use crate::watermark::types::{Placement, TextBoundingBox};

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_SPACING: u32 = 1;

/// Nominal pixel size of one unscaled glyph cell.
const NOMINAL_SIZE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinFont {
    scale: u32,
}

impl BuiltinFont {
    /// Pick the integer block scale closest to the requested pixel size.
    pub fn for_size(size: u32) -> Self {
        let scale = (size as f32 / NOMINAL_SIZE).round() as u32;
        Self {
            scale: scale.max(1),
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn line_height(&self) -> u32 {
        GLYPH_HEIGHT.saturating_mul(self.scale)
    }

    /// Two blank cell rows between stacked lines.
    pub fn line_spacing(&self) -> u32 {
        2u32.saturating_mul(self.scale)
    }

    fn advance(&self) -> u32 {
        (GLYPH_WIDTH + GLYPH_SPACING).saturating_mul(self.scale)
    }

    pub fn measure(&self, text: &str) -> TextBoundingBox {
        let count = text.chars().count() as u32;
        if count == 0 {
            return TextBoundingBox {
                width: 0,
                height: 0,
            };
        }

        TextBoundingBox {
            width: count
                .saturating_mul(self.advance())
                .saturating_sub(GLYPH_SPACING.saturating_mul(self.scale)),
            height: self.line_height(),
        }
    }

    /// Draw `text` with its top-left corner at `origin`. Lit cells overwrite
    /// the canvas; cells outside the canvas are dropped.
    pub fn draw(&self, canvas: &mut RgbaImage, text: &str, origin: Placement, color: Rgba<u8>) {
        let advance = self.advance() as i64;
        let mut x = origin.x;

        for ch in text.chars() {
            if x >= canvas.width() as i64 {
                break;
            }
            self.draw_glyph(canvas, glyph_rows(ch), Placement::new(x, origin.y), color);
            x = x.saturating_add(advance);
        }
    }

    fn draw_glyph(&self, canvas: &mut RgbaImage, rows: [u8; 7], at: Placement, color: Rgba<u8>) {
        let (width, height) = (canvas.width() as i64, canvas.height() as i64);
        let scale = self.scale as i64;

        for (row, bits) in rows.iter().enumerate() {
            let cell_y = at.y.saturating_add((row as i64).saturating_mul(scale));
            let (top, bottom) = (cell_y.max(0), cell_y.saturating_add(scale).min(height));
            if top >= bottom {
                continue;
            }

            for col in 0..GLYPH_WIDTH {
                if (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 0 {
                    continue;
                }
                let cell_x = at.x.saturating_add((col as i64).saturating_mul(scale));
                let (left, right) = (cell_x.max(0), cell_x.saturating_add(scale).min(width));
                for py in top..bottom {
                    for px in left..right {
                        canvas.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }
}

// Each row is 5 bits, leftmost column in bit 4.
#[rustfmt::skip]
fn glyph_rows(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        ' ' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        ',' => [0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b00100, 0b01000],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        ';' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b00100, 0b01000],
        '!' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '_' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111],
        '+' => [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
        '=' => [0b00000, 0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000],
        '\'' => [0b00100, 0b00100, 0b01000, 0b00000, 0b00000, 0b00000, 0b00000],
        '"' => [0b01010, 0b01010, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000],
        '(' => [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010],
        ')' => [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000],
        '/' => [0b00001, 0b00010, 0b00010, 0b00100, 0b01000, 0b01000, 0b10000],
        '&' => [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101],
        '@' => [0b01110, 0b10001, 0b10111, 0b10101, 0b10111, 0b10000, 0b01110],
        '#' => [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010],
        '%' => [0b11000, 0b11001, 0b00010, 0b00100, 0b01000, 0b10011, 0b00011],
        '©' => [0b01110, 0b10001, 0b10111, 0b10100, 0b10111, 0b10001, 0b01110],
        _ => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_from_size() {
        assert_eq!(BuiltinFont::for_size(1).scale(), 1);
        assert_eq!(BuiltinFont::for_size(8).scale(), 1);
        assert_eq!(BuiltinFont::for_size(40).scale(), 5);
        assert_eq!(BuiltinFont::for_size(44).scale(), 6);
    }

    #[test]
    fn test_measure() {
        let font = BuiltinFont::for_size(8);
        assert_eq!(
            font.measure("PROOF"),
            TextBoundingBox {
                width: 29,
                height: 7
            }
        );
        assert_eq!(font.measure(""), TextBoundingBox { width: 0, height: 0 });

        let font = BuiltinFont::for_size(16);
        assert_eq!(
            font.measure("AB"),
            TextBoundingBox {
                width: 22,
                height: 14
            }
        );
    }

    #[test]
    fn test_draw_stays_inside_measured_box() {
        let font = BuiltinFont::for_size(16);
        let mut canvas = RgbaImage::from_pixel(60, 30, Rgba([0, 0, 0, 0]));
        font.draw(&mut canvas, "HI", Placement::new(3, 4), Rgba([255, 0, 0, 255]));

        let bbox = font.measure("HI");
        for (x, y, pixel) in canvas.enumerate_pixels() {
            if pixel[3] != 0 {
                assert!(x >= 3 && x < 3 + bbox.width, "x={x}");
                assert!(y >= 4 && y < 4 + bbox.height, "y={y}");
            }
        }
        // Top-left cell of 'H' is lit.
        assert_eq!(canvas.get_pixel(3, 4), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_draw_clips_off_canvas() {
        let font = BuiltinFont::for_size(8);
        let mut canvas = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        font.draw(&mut canvas, "W", Placement::new(-2, -3), Rgba([255, 255, 255, 255]));
        font.draw(&mut canvas, "W", Placement::new(100, 100), Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.dimensions(), (4, 4));
    }

    #[test]
    fn test_huge_size_saturates_and_clips() {
        let font = BuiltinFont::for_size(u32::MAX);
        let bbox = font.measure("PROOF");
        assert_eq!(bbox.width, u32::MAX);
        assert_eq!(bbox.height, u32::MAX);

        let mut canvas = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        font.draw(&mut canvas, "PROOF", Placement::new(0, 0), Rgba([255, 255, 255, 255]));
        // The first cell of 'P' covers the whole canvas.
        assert!(canvas.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_lowercase_uses_uppercase_glyphs() {
        assert_eq!(glyph_rows('a'), glyph_rows('A'));
        assert_eq!(glyph_rows('~'), glyph_rows('?'));
    }
}
