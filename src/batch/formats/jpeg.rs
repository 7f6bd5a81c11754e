use image::{DynamicImage, ImageEncoder, codecs::jpeg::JpegEncoder};
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

use crate::batch::BatchError;
use crate::watermark::WatermarkError;

/// Save an already-flattened image as JPEG.
///
/// JPEG has no alpha channel, so anything other than 8-bit RGB is refused
/// rather than silently dropping transparency.
pub fn save(image: &DynamicImage, path: &Path, quality: u8) -> Result<(), BatchError> {
    let rgb_image = image.as_rgb8().ok_or(
        WatermarkError::UnsupportedColorModelConversion {
            width: image.width(),
            height: image.height(),
            target: "JPEG (RGB)",
        },
    )?;

    let output = BufWriter::new(std::fs::File::create(path)?);
    let encoder = JpegEncoder::new_with_quality(output, quality);
    encoder.write_image(
        rgb_image,
        rgb_image.width(),
        rgb_image.height(),
        image::ExtendedColorType::Rgb8,
    )?;

    debug!("JPEG written to {:?} at quality {}", path, quality);
    Ok(())
}
