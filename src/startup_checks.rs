use crate::Config;
use crate::watermark::{FontResolver, ResolutionStage};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Input directory does not exist: {0:?}")]
    InputDirectoryMissing(PathBuf),

    #[error("Failed to create output directory {path:?}: {source}")]
    OutputDirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Overlay image not found: {0:?}")]
    OverlayMissing(PathBuf),

    #[error("Font family '{0}' not found, the built-in bitmap font will be used")]
    FontFamilyUnavailable(String),
}

impl StartupCheckError {
    /// Critical failures stop the batch; the rest only degrade the output.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            StartupCheckError::InputDirectoryMissing(_)
                | StartupCheckError::OutputDirectoryCreationFailed { .. }
        )
    }
}

pub async fn perform_startup_checks(
    config: &Config,
    fonts: &FontResolver,
) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let input_dir = &config.batch.input_directory;
    if tokio::fs::read_dir(input_dir).await.is_ok() {
        info!("Input directory exists: {:?}", input_dir);
    } else {
        error!("Input directory does not exist or is not readable: {:?}", input_dir);
        errors.push(StartupCheckError::InputDirectoryMissing(input_dir.clone()));
    }

    let output_dir = &config.batch.output_directory;
    if output_dir.exists() {
        info!("Output directory exists: {:?}", output_dir);
    } else {
        info!("Output directory does not exist, creating: {:?}", output_dir);
        match tokio::fs::create_dir_all(output_dir).await {
            Ok(()) => info!("Output directory created successfully"),
            Err(e) => {
                error!("Failed to create output directory {:?}: {}", output_dir, e);
                errors.push(StartupCheckError::OutputDirectoryCreationFailed {
                    path: output_dir.clone(),
                    source: e,
                });
            }
        }
    }

    if let Some(overlay) = &config.overlay.path {
        if overlay.is_file() {
            info!("Overlay image found: {:?}", overlay);
        } else {
            warn!("Overlay image missing: {:?}", overlay);
            errors.push(StartupCheckError::OverlayMissing(overlay.clone()));
        }
    }

    let family = &config.text.font_family;
    let font = fonts.resolve(family, config.text.font_size);
    match font.stage() {
        ResolutionStage::Builtin => {
            warn!("No font file found for '{}'", family);
            errors.push(StartupCheckError::FontFamilyUnavailable(family.clone()));
        }
        stage => info!(
            "Font '{}' resolved via {} ({:?})",
            family,
            stage.as_str(),
            font.path()
        ),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watermark::FontCatalog;
    use tempfile::TempDir;

    fn builtin_fonts() -> FontResolver {
        FontResolver::with_catalog(FontCatalog::empty())
    }

    #[tokio::test]
    async fn test_creates_output_directory() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.batch.input_directory = temp.path().to_path_buf();
        config.batch.output_directory = temp.path().join("out/nested");

        let errors = perform_startup_checks(&config, &builtin_fonts())
            .await
            .unwrap_err();

        assert!(temp.path().join("out/nested").is_dir());
        // Only the font warning remains with an empty catalog.
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            StartupCheckError::FontFamilyUnavailable(_)
        ));
        assert!(!errors[0].is_critical());
    }

    #[tokio::test]
    async fn test_missing_input_is_critical() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.batch.input_directory = temp.path().join("missing");
        config.batch.output_directory = temp.path().join("out");
        config.overlay.path = Some(temp.path().join("logo.png"));

        let errors = perform_startup_checks(&config, &builtin_fonts())
            .await
            .unwrap_err();

        assert!(errors.iter().any(|e| e.is_critical()));
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, StartupCheckError::OverlayMissing(_)))
        );
    }
}
