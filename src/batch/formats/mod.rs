pub mod jpeg;
pub mod png;

use image::{
    DynamicImage, ImageError,
    error::{UnsupportedError, UnsupportedErrorKind},
};
use std::path::Path;
use tracing::debug;

use crate::batch::BatchError;
use crate::watermark::{OutputFormat, WatermarkError};

/// Write `image` to `path` in `format`.
///
/// The image is expected to already be in the color model the format asks
/// for (see [`OutputFormat::color_model`]). An encoder that refuses the
/// pixel layout is reported as an unsupported color conversion.
pub fn encode_to_path(
    image: &DynamicImage,
    path: &Path,
    format: OutputFormat,
    jpeg_quality: u8,
) -> Result<(), BatchError> {
    debug!("Encoding {:?} as {:?}", path, format);

    let result = match format {
        OutputFormat::Jpeg => jpeg::save(image, path, jpeg_quality),
        OutputFormat::Png => png::save(image, path),
        OutputFormat::Bmp | OutputFormat::Tiff | OutputFormat::WebP => image
            .save_with_format(path, format.image_format())
            .map_err(BatchError::from),
    };

    result.map_err(|err| match err {
        BatchError::ImageError(ImageError::Unsupported(ref unsupported))
            if is_color_rejection(unsupported) =>
        {
            BatchError::Watermark(WatermarkError::UnsupportedColorModelConversion {
                width: image.width(),
                height: image.height(),
                target: format.extension(),
            })
        }
        other => other,
    })
}

fn is_color_rejection(error: &UnsupportedError) -> bool {
    matches!(error.kind(), UnsupportedErrorKind::Color(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn test_jpeg_requires_rgb() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.jpg");
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 4])));

        let err = encode_to_path(&rgba, &path, OutputFormat::Jpeg, 95).unwrap_err();
        assert!(matches!(
            err,
            BatchError::Watermark(WatermarkError::UnsupportedColorModelConversion { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_jpeg_roundtrip_dimensions() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.jpg");
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 8, Rgb([200, 100, 50])));

        encode_to_path(&rgb, &path, OutputFormat::Jpeg, 95).unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn test_png_keeps_alpha() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.png");
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba([9, 8, 7, 100])));

        encode_to_path(&rgba, &path, OutputFormat::Png, 95).unwrap();
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(1, 1), &Rgba([9, 8, 7, 100]));
    }

    #[test]
    fn test_bmp_and_tiff_write() {
        let temp = TempDir::new().unwrap();
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(5, 4, Rgba([0, 0, 0, 255])));

        for format in [OutputFormat::Bmp, OutputFormat::Tiff] {
            let path = temp.path().join(format!("out.{}", format.extension()));
            encode_to_path(&rgba, &path, format, 95).unwrap();
            let decoded = image::open(&path).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (5, 4));
        }
    }
}
