// Batch runner - discovers images, pairs them with captions, watermarks and writes them
pub mod discover;
mod error;
pub mod formats;
pub mod sidecar;

pub use discover::{IMAGE_EXTENSIONS, discover_images, is_image};
pub use error::BatchError;
pub use formats::encode_to_path;
pub use sidecar::{caption_for, read_sidecar, sidecar_path};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::Config;
use crate::watermark::{
    FontResolver, OutputFormat, OverlayImage, OverlayLayer, StepDiagnostic, TextSettings,
    WatermarkConfig, WatermarkPipeline,
};

/// Result of watermarking a single file.
#[derive(Debug)]
pub struct FileReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub result: Result<Vec<StepDiagnostic>, BatchError>,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.files.iter().filter(|f| f.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| !f.is_ok()).count()
    }

    /// Steps skipped across files that were otherwise written.
    pub fn diagnostics(&self) -> usize {
        self.files
            .iter()
            .filter_map(|f| f.result.as_ref().ok())
            .map(Vec::len)
            .sum()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Everything a worker needs to process one file.
struct BatchJob {
    input: PathBuf,
    output: PathBuf,
    sidecar_extension: String,
    jpeg_quality: u8,
    overlay: Option<OverlayLayer>,
    text: TextSettings,
    pipeline: WatermarkPipeline,
}

pub struct BatchRunner {
    job: Arc<BatchJob>,
    workers: usize,
}

impl BatchRunner {
    /// Build a runner from `config`, decoding the overlay once up front.
    pub fn from_config(config: &Config, fonts: Arc<FontResolver>) -> Result<Self, BatchError> {
        let overlay = match &config.overlay.path {
            Some(path) => {
                let image = OverlayImage::load(path);
                if let OverlayImage::Unavailable { reason, .. } = &image {
                    warn!("Overlay {:?} unavailable: {}", path, reason);
                }
                Some(config.overlay.layer(image)?)
            }
            None => None,
        };

        // Validate text settings once rather than failing every file.
        config.text.layer("")?;

        let job = BatchJob {
            input: config.batch.input_directory.clone(),
            output: config.batch.output_directory.clone(),
            sidecar_extension: config.batch.sidecar_extension.clone(),
            jpeg_quality: config.output.jpeg_quality,
            overlay,
            text: config.text.clone(),
            pipeline: WatermarkPipeline::new(fonts),
        };

        Ok(Self {
            job: Arc::new(job),
            workers: config.batch.worker_count(),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Where `source` ends up under the output directory.
    pub fn output_path(&self, source: &Path) -> PathBuf {
        self.job.output_path(source)
    }

    /// Watermark every image under the input directory.
    ///
    /// A file that fails is recorded in the report and the batch moves on.
    pub async fn run(&self) -> Result<BatchReport, BatchError> {
        let input = &self.job.input;
        if !input.is_dir() {
            return Err(BatchError::InputDirectoryMissing(input.clone()));
        }

        let exclude = nested_output(input, &self.job.output);
        let sources = discover_images(input, exclude.as_deref());
        info!(
            "Found {} images in {:?}, processing with {} workers",
            sources.len(),
            input,
            self.workers
        );

        let semaphore = Arc::new(Semaphore::new(self.workers.max(1)));
        let mut handles = Vec::with_capacity(sources.len());

        for source in sources {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| BatchError::Worker(e.to_string()))?;
            let job = self.job.clone();
            let task_source = source.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                job.process(&task_source)
            });
            handles.push((source, handle));
        }

        let mut report = BatchReport::default();
        for (source, handle) in handles {
            let output = self.job.output_path(&source);
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(BatchError::Worker(e.to_string())),
            };

            match &result {
                Ok(diagnostics) if diagnostics.is_empty() => {
                    info!("Watermarked {:?} -> {:?}", source, output)
                }
                Ok(diagnostics) => warn!(
                    "Watermarked {:?} -> {:?} with {} skipped step(s)",
                    source,
                    output,
                    diagnostics.len()
                ),
                Err(e) => error!("Failed to watermark {:?}: {}", source, e),
            }

            report.files.push(FileReport {
                source,
                output,
                result,
            });
        }

        info!(
            "Batch finished: {} processed, {} failed",
            report.processed(),
            report.failed()
        );
        Ok(report)
    }
}

/// The output directory expressed under `input`, when it lives inside it.
///
/// Both sides are canonicalized so `photos` and `./photos/out` are seen as
/// nested. The result is rebuilt on `input` to match the paths discovery
/// yields. An output directory that does not exist yet holds nothing to skip.
fn nested_output(input: &Path, output: &Path) -> Option<PathBuf> {
    let canonical_input = input.canonicalize().ok()?;
    let canonical_output = output.canonicalize().ok()?;
    let relative = canonical_output.strip_prefix(&canonical_input).ok()?;
    Some(input.join(relative))
}

impl BatchJob {
    fn output_path(&self, source: &Path) -> PathBuf {
        match source.strip_prefix(&self.input) {
            Ok(relative) => self.output.join(relative),
            Err(_) => self
                .output
                .join(source.file_name().unwrap_or(source.as_os_str())),
        }
    }

    fn process(&self, source: &Path) -> Result<Vec<StepDiagnostic>, BatchError> {
        let output = self.output_path(source);
        let format = OutputFormat::from_path(&output)
            .ok_or_else(|| BatchError::UnsupportedOutputFormat(output.clone()))?;

        let reader = image::ImageReader::open(source)?.with_guessed_format()?;
        let base = reader.decode()?;
        debug!("Decoded {:?} ({}x{})", source, base.width(), base.height());

        let text = caption_for(source, &self.sidecar_extension, self.text.default_text.as_deref())
            .map(|caption| self.text.layer(caption))
            .transpose()?;

        let config = WatermarkConfig {
            overlay: self.overlay.clone(),
            text,
        };
        let outcome = self.pipeline.apply(base, &config, format.color_model())?;

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        encode_to_path(&outcome.image, &output, format, self.jpeg_quality)?;

        Ok(outcome.diagnostics)
    }
}
