// Watermark engine - overlay compositing, text layout and rendering, font resolution
pub mod config;
pub mod error;
pub mod font;
pub mod layout;
pub mod overlay;
pub mod pipeline;
pub mod text;
pub mod types;

pub use config::{
    OverlayImage, OverlayLayer, OverlaySettings, TextLayer, TextSettings, WatermarkConfig,
};
pub use error::{ConfigError, WatermarkError};
pub use font::{
    FontCache, FontCatalog, FontCatalogConfig, FontResolver, FontResource, ResolutionStage,
};
pub use layout::{TextLayout, layout_text};
pub use overlay::{composite_overlay, overlay_size, plan_overlay};
pub use pipeline::{
    PipelineStep, StepDiagnostic, WatermarkOutcome, WatermarkPipeline, flatten_onto_white,
};
pub use text::{TextStyle, render_text};
pub use types::{AnchorCorner, ColorModel, OutputFormat, Placement, Rgb, TextBoundingBox};
