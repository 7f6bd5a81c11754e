use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use photomark::{
    Config,
    batch::{BatchRunner, caption_for, encode_to_path},
    startup_checks,
    watermark::{
        FontCatalog, FontResolver, OutputFormat, OverlayImage, TextLayer, WatermarkConfig,
        WatermarkPipeline, config::MAX_FONT_SIZE,
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "photomark.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watermark every image in the input directory (default if no command specified)
    Batch {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of images processed at once
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Watermark a single image
    Apply {
        input: PathBuf,
        output: PathBuf,

        /// Text to draw instead of the sidecar or default text
        #[arg(short, long)]
        text: Option<String>,

        /// Size the text and its padding from the image dimensions
        #[arg(long)]
        auto_size: bool,
    },

    /// Show how a font family resolves
    Fonts {
        family: Option<String>,

        #[arg(short, long)]
        size: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging first
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load(&cli.config)?;
    let fonts = Arc::new(FontResolver::with_catalog(FontCatalog::from_config(
        &config.fonts,
    )));

    match cli.command {
        Some(Commands::Batch {
            input,
            output,
            workers,
        }) => run_batch(config, fonts, input, output, workers).await,
        Some(Commands::Apply {
            input,
            output,
            text,
            auto_size,
        }) => run_apply(config, fonts, input, output, text, auto_size).await,
        Some(Commands::Fonts { family, size }) => {
            show_font(&config, &fonts, family, size);
            Ok(())
        }
        None => run_batch(config, fonts, None, None, None).await,
    }
}

async fn run_batch(
    mut config: Config,
    fonts: Arc<FontResolver>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    workers: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(input) = input {
        config.batch.input_directory = input;
    }
    if let Some(output) = output {
        config.batch.output_directory = output;
    }
    if workers.is_some() {
        config.batch.workers = workers;
    }

    info!("Input directory: {:?}", config.batch.input_directory);
    info!("Output directory: {:?}", config.batch.output_directory);

    match startup_checks::perform_startup_checks(&config, &fonts).await {
        Ok(()) => info!("All startup checks passed"),
        Err(errors) => {
            for error in &errors {
                tracing::error!("Startup check failed: {}", error);
            }

            if errors.iter().any(|e| e.is_critical()) {
                tracing::error!("Critical startup check failed, exiting");
                return Err("Critical startup check failed".into());
            } else {
                tracing::warn!("Non-critical startup checks failed, continuing");
            }
        }
    }

    let runner = BatchRunner::from_config(&config, fonts)?;
    let report = runner.run().await?;

    for file in &report.files {
        match &file.result {
            Ok(diagnostics) => {
                println!("ok      {}", file.source.display());
                for diagnostic in diagnostics {
                    println!("        {}", diagnostic);
                }
            }
            Err(e) => println!("FAILED  {}: {}", file.source.display(), e),
        }
    }
    println!(
        "{} processed, {} failed, {} skipped steps",
        report.processed(),
        report.failed(),
        report.diagnostics()
    );

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_apply(
    config: Config,
    fonts: Arc<FontResolver>,
    input: PathBuf,
    output: PathBuf,
    text: Option<String>,
    auto_size: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = OutputFormat::from_path(&output)
        .ok_or_else(|| format!("Unsupported output format: {:?}", output))?;

    tokio::task::spawn_blocking(move || -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let base = image::ImageReader::open(&input)?
            .with_guessed_format()?
            .decode()?;
        let (width, height) = (base.width(), base.height());

        let overlay = match &config.overlay.path {
            Some(path) => Some(config.overlay.layer(OverlayImage::load(path))?),
            None => None,
        };

        let caption = match text {
            Some(text) => Some(text),
            None => caption_for(
                &input,
                &config.batch.sidecar_extension,
                config.text.default_text.as_deref(),
            ),
        };
        let text = match caption {
            Some(caption) => {
                let mut layer = config.text.layer(caption)?;
                if auto_size {
                    layer.font_size =
                        TextLayer::recommended_font_size(width, height).clamp(1, MAX_FONT_SIZE);
                    layer.padding = TextLayer::recommended_padding(width, height);
                }
                Some(layer)
            }
            None => None,
        };

        let pipeline = WatermarkPipeline::new(fonts);
        let outcome = pipeline.apply(
            base,
            &WatermarkConfig { overlay, text },
            format.color_model(),
        )?;

        if let Some(parent) = output.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        encode_to_path(
            &outcome.image,
            &output,
            format,
            config.output.jpeg_quality,
        )?;

        for diagnostic in &outcome.diagnostics {
            println!("{}", diagnostic);
        }
        println!("Wrote {}", output.display());
        Ok(())
    })
    .await?
    .map_err(|e| -> Box<dyn std::error::Error> { e })
}

fn show_font(config: &Config, fonts: &FontResolver, family: Option<String>, size: Option<u32>) {
    let family = family.unwrap_or_else(|| config.text.font_family.clone());
    let size = size.unwrap_or(config.text.font_size);

    let font = fonts.resolve(&family, size);
    println!("family:  {}", family);
    println!("size:    {}", font.size());
    println!("stage:   {}", font.stage().as_str());
    match font.path() {
        Some(path) => println!("path:    {}", path.display()),
        None => println!("path:    (built-in bitmap font)"),
    }

    let candidates = fonts.catalog().candidates(&family);
    if !candidates.is_empty() {
        println!("candidates:");
        for candidate in candidates {
            let marker = if candidate.exists() { "+" } else { "-" };
            println!("  {} {}", marker, candidate.display());
        }
    }
}
