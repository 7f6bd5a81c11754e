use image::{ColorType, Rgb, RgbImage, Rgba, RgbaImage};
use photomark::Config;
use photomark::batch::{BatchError, BatchRunner};
use photomark::watermark::{
    FontCatalog, FontResolver, PipelineStep, ResolutionStage, WatermarkError,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn builtin_fonts() -> Arc<FontResolver> {
    Arc::new(FontResolver::with_catalog(FontCatalog::empty()))
}

fn config_for(root: &Path) -> Config {
    let mut config = Config::default();
    config.batch.input_directory = root.join("input");
    config.batch.output_directory = root.join("output");
    config.batch.workers = Some(2);
    config
}

fn write_photo(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_pixel(width, height, Rgb([90, 90, 90]))
        .save(path)
        .unwrap();
}

fn write_transparent_png(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]))
        .save(path)
        .unwrap();
}

#[tokio::test]
async fn test_batch_preserves_structure_and_formats() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_photo(&root.join("input/a.jpg"), 200, 150);
    write_transparent_png(&root.join("input/2024/trip/b.png"), 200, 150);
    std::fs::write(root.join("input/2024/trip/b.txt"), "PROOF\n").unwrap();
    std::fs::write(root.join("input/notes.txt"), "not an image").unwrap();

    let runner = BatchRunner::from_config(&config_for(root), builtin_fonts()).unwrap();
    let report = runner.run().await.unwrap();

    assert_eq!(report.files.len(), 2);
    assert_eq!(report.processed(), 2);
    assert!(report.is_success());
    assert_eq!(report.diagnostics(), 0);

    let jpeg = image::open(root.join("output/a.jpg")).unwrap();
    assert_eq!(jpeg.color(), ColorType::Rgb8);
    assert_eq!((jpeg.width(), jpeg.height()), (200, 150));

    let png = image::open(root.join("output/2024/trip/b.png")).unwrap();
    assert_eq!(png.color(), ColorType::Rgba8);
    let png = png.to_rgba8();
    // Caption starts at (20, 150 - 35 - 20) with the built-in font at size 40.
    assert_eq!(png.get_pixel(20, 95), &Rgba([255, 255, 255, 255]));
    // Away from the caption the transparent source is untouched.
    assert_eq!(png.get_pixel(180, 10)[3], 0);

    assert!(!root.join("output/notes.txt").exists());
}

#[tokio::test]
async fn test_default_text_applies_without_sidecar() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_transparent_png(&root.join("input/c.png"), 200, 150);

    let mut config = config_for(root);
    config.text.default_text = Some("PROOF".to_string());
    let runner = BatchRunner::from_config(&config, builtin_fonts()).unwrap();
    runner.run().await.unwrap();

    let png = image::open(root.join("output/c.png")).unwrap().to_rgba8();
    assert_eq!(png.get_pixel(20, 95), &Rgba([255, 255, 255, 255]));
}

#[tokio::test]
async fn test_missing_overlay_is_a_diagnostic() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_photo(&root.join("input/a.jpg"), 64, 64);
    write_photo(&root.join("input/b.jpg"), 64, 64);

    let mut config = config_for(root);
    config.overlay.path = Some(root.join("logo.png"));
    let runner = BatchRunner::from_config(&config, builtin_fonts()).unwrap();
    let report = runner.run().await.unwrap();

    assert_eq!(report.processed(), 2);
    assert_eq!(report.diagnostics(), 2);
    for file in &report.files {
        let diagnostics = file.result.as_ref().unwrap();
        assert_eq!(diagnostics[0].step, PipelineStep::Overlay);
        assert!(matches!(
            diagnostics[0].error,
            WatermarkError::OverlayLoadFailure { .. }
        ));
        assert!(file.output.exists());
    }
}

#[tokio::test]
async fn test_overlay_is_composited() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_transparent_png(&root.join("input/a.png"), 100, 100);
    RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]))
        .save(root.join("logo.png"))
        .unwrap();

    let mut config = config_for(root);
    config.overlay.path = Some(root.join("logo.png"));
    config.overlay.scale = 0.1;
    config.overlay.padding = 5;
    let runner = BatchRunner::from_config(&config, builtin_fonts()).unwrap();
    let report = runner.run().await.unwrap();
    assert_eq!(report.diagnostics(), 0);

    let png = image::open(root.join("output/a.png")).unwrap().to_rgba8();
    // 10x10 logo in the bottom-right corner, 5px in.
    assert_eq!(png.get_pixel(90, 90), &Rgba([255, 0, 0, 255]));
    assert_eq!(png.get_pixel(85, 85), &Rgba([255, 0, 0, 255]));
    assert_eq!(png.get_pixel(95, 95)[3], 0);
}

#[tokio::test]
async fn test_corrupt_file_does_not_stop_batch() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_photo(&root.join("input/good.jpg"), 32, 32);
    std::fs::write(root.join("input/broken.jpg"), b"definitely not a jpeg").unwrap();

    let runner = BatchRunner::from_config(&config_for(root), builtin_fonts()).unwrap();
    let report = runner.run().await.unwrap();

    assert_eq!(report.processed(), 1);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_success());

    let broken = report
        .files
        .iter()
        .find(|f| f.source.ends_with("broken.jpg"))
        .unwrap();
    assert!(matches!(broken.result, Err(BatchError::ImageError(_))));
    assert!(root.join("output/good.jpg").exists());
    assert!(!root.join("output/broken.jpg").exists());
}

#[tokio::test]
async fn test_multiline_sidecar_is_drawn() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_transparent_png(&root.join("input/d.png"), 200, 150);
    std::fs::write(root.join("input/d.txt"), "PROOF\n2024\n").unwrap();

    let runner = BatchRunner::from_config(&config_for(root), builtin_fonts()).unwrap();
    let report = runner.run().await.unwrap();
    assert_eq!(report.processed(), 1);
    assert_eq!(report.diagnostics(), 0);

    // Two 35px lines 45px apart, bottom-left with 20px padding.
    let png = image::open(root.join("output/d.png")).unwrap().to_rgba8();
    assert_eq!(png.get_pixel(20, 50), &Rgba([255, 255, 255, 255]));
    assert_eq!(png.get_pixel(25, 95), &Rgba([255, 255, 255, 255]));
    assert_eq!(png.get_pixel(20, 95)[3], 0);
}

#[tokio::test]
async fn test_font_file_from_catalog_is_used() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_transparent_png(&root.join("input/e.png"), 300, 120);
    std::fs::write(root.join("input/e.txt"), "Jane Doe").unwrap();

    let font_path =
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fonts/DejaVuSans.ttf");
    let fonts = Arc::new(FontResolver::with_catalog(
        FontCatalog::empty().with_family("Fixture Sans", [font_path.clone()]),
    ));

    let mut config = config_for(root);
    config.text.font_family = "Fixture Sans".to_string();
    config.text.font_size = 32;
    let runner = BatchRunner::from_config(&config, fonts.clone()).unwrap();
    let report = runner.run().await.unwrap();
    assert_eq!(report.processed(), 1);

    let font = fonts.resolve("Fixture Sans", 32);
    assert_eq!(font.stage(), ResolutionStage::Exact);
    assert_eq!(font.path(), Some(font_path.as_path()));

    let png = image::open(root.join("output/e.png")).unwrap().to_rgba8();
    assert!(png.pixels().any(|p| p.0 == [255, 255, 255, 255]));
    assert!(png.pixels().any(|p| p.0 == [0, 0, 0, 255]));
}

#[tokio::test]
async fn test_nested_output_is_not_reprocessed() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_photo(&root.join("input/a.jpg"), 32, 32);

    let mut config = config_for(root);
    config.batch.output_directory = root.join("input/watermarked");
    let runner = BatchRunner::from_config(&config, builtin_fonts()).unwrap();

    assert_eq!(runner.run().await.unwrap().files.len(), 1);
    assert!(root.join("input/watermarked/a.jpg").exists());
    assert_eq!(runner.run().await.unwrap().files.len(), 1);
}

#[tokio::test]
async fn test_nested_output_with_parent_components_is_not_reprocessed() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_photo(&root.join("input/a.jpg"), 32, 32);

    let mut config = config_for(root);
    config.batch.output_directory = root.join("input/../input/watermarked");
    let runner = BatchRunner::from_config(&config, builtin_fonts()).unwrap();

    assert_eq!(runner.run().await.unwrap().files.len(), 1);
    assert!(root.join("input/watermarked/a.jpg").exists());

    let second = runner.run().await.unwrap();
    assert_eq!(second.files.len(), 1);
    assert!(second.files[0].source.ends_with("a.jpg"));
    assert!(!root.join("input/watermarked/watermarked").exists());
}
