//! Font resolution with a per-resolver cache.
//!
//! A [`FontResolver`] turns a `(family, size)` request into a renderable
//! [`FontResource`]. It never fails: when no candidate file loads it hands
//! out the built-in bitmap face. Resolved resources are cached for the
//! lifetime of the resolver's [`FontCache`].

mod builtin;
mod catalog;

pub use builtin::BuiltinFont;
pub use catalog::{
    FontCatalog, FontCatalogConfig, FontLoader, FsFontLoader, ResolutionStage, SelectedFace,
    select_face,
};

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use super::error::WatermarkError;
use super::types::{Placement, TextBoundingBox};

#[derive(Clone)]
pub enum FontFace {
    Outline(FontArc),
    Builtin(BuiltinFont),
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontFace::Outline(_) => f.write_str("Outline"),
            FontFace::Builtin(font) => write!(f, "Builtin(scale={})", font.scale()),
        }
    }
}

/// A typeface bound to one pixel size.
#[derive(Debug, Clone)]
pub struct FontResource {
    family: String,
    size: u32,
    stage: ResolutionStage,
    path: Option<PathBuf>,
    face: FontFace,
}

impl FontResource {
    /// The built-in bitmap face, sized as close to `size` as its block
    /// scaling allows.
    pub fn builtin(family: &str, size: u32) -> Self {
        Self {
            family: family.to_string(),
            size,
            stage: ResolutionStage::Builtin,
            path: None,
            face: FontFace::Builtin(BuiltinFont::for_size(size)),
        }
    }

    pub fn outline(family: &str, size: u32, face: FontArc, path: Option<PathBuf>) -> Self {
        Self {
            family: family.to_string(),
            size,
            stage: ResolutionStage::Exact,
            path,
            face: FontFace::Outline(face),
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn stage(&self) -> ResolutionStage {
        self.stage
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn face(&self) -> &FontFace {
        &self.face
    }

    fn scale(&self) -> PxScale {
        PxScale::from(self.size as f32)
    }

    /// Height of one line of text, without spacing.
    pub fn line_height(&self) -> u32 {
        match &self.face {
            FontFace::Outline(face) => {
                let height = face.as_scaled(self.scale()).height();
                height.ceil().max(1.0) as u32
            }
            FontFace::Builtin(font) => font.line_height(),
        }
    }

    /// Distance between the tops of two consecutive lines.
    pub fn line_advance(&self) -> u32 {
        let spacing = match &self.face {
            FontFace::Outline(_) => OUTLINE_LINE_SPACING,
            FontFace::Builtin(font) => font.line_spacing(),
        };
        self.line_height().saturating_add(spacing)
    }

    /// Bounding box of `text` as this resource renders it.
    ///
    /// Lines are split on `\n` (a trailing `\r` is dropped) and stacked
    /// [`line_advance`](Self::line_advance) apart. Any other control character
    /// fails the measurement.
    pub fn measure(&self, text: &str) -> Result<TextBoundingBox, WatermarkError> {
        let lines = split_lines(text)?;
        let Some(last) = lines.last() else {
            return Ok(TextBoundingBox {
                width: 0,
                height: 0,
            });
        };

        let width = lines
            .iter()
            .map(|line| self.measure_line(line).width)
            .max()
            .unwrap_or(0);
        let stacked = (lines.len() as u32 - 1).saturating_mul(self.line_advance());
        let height = stacked.saturating_add(self.measure_line(last).height);

        Ok(TextBoundingBox { width, height })
    }

    fn measure_line(&self, line: &str) -> TextBoundingBox {
        match &self.face {
            FontFace::Outline(face) => {
                let (width, height) = text_size(self.scale(), face, line);
                TextBoundingBox { width, height }
            }
            FontFace::Builtin(font) => font.measure(line),
        }
    }

    /// Draw `text` with its bounding box's top-left corner at `origin`.
    pub fn draw(&self, canvas: &mut RgbaImage, text: &str, origin: Placement, color: Rgba<u8>) {
        let advance = self.line_advance() as i64;
        for (index, line) in text.lines().enumerate() {
            let at = origin.offset(0, (index as i64).saturating_mul(advance));
            self.draw_line(canvas, line, at, color);
        }
    }

    fn draw_line(&self, canvas: &mut RgbaImage, line: &str, origin: Placement, color: Rgba<u8>) {
        match &self.face {
            FontFace::Outline(face) => {
                let x = origin.x.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
                let y = origin.y.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
                draw_text_mut(canvas, color, x, y, self.scale(), face, line);
            }
            FontFace::Builtin(font) => font.draw(canvas, line, origin, color),
        }
    }
}

/// Pixels between lines set in an outline face.
const OUTLINE_LINE_SPACING: u32 = 4;

fn split_lines(text: &str) -> Result<Vec<&str>, WatermarkError> {
    let lines: Vec<&str> = text.lines().collect();
    for line in &lines {
        if let Some(bad) = line.chars().find(|c| c.is_control()) {
            return Err(WatermarkError::TextMeasurementFailure {
                text: text.to_string(),
                reason: format!("unsupported control character {:?}", bad),
            });
        }
    }
    Ok(lines)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontKey {
    pub family: String,
    pub size: u32,
}

impl FontKey {
    pub fn new(family: &str, size: u32) -> Self {
        Self {
            family: catalog::normalize_family(family),
            size,
        }
    }
}

/// Resolved fonts keyed by `(family, size)`. Entries are never evicted.
#[derive(Debug, Default)]
pub struct FontCache {
    entries: RwLock<HashMap<FontKey, Arc<FontResource>>>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &FontKey) -> Option<Arc<FontResource>> {
        self.entries.read().get(key).cloned()
    }

    /// Insert unless another resolution got there first. Returns whichever
    /// resource ends up cached so racing callers converge on one value.
    pub fn insert_if_absent(&self, key: FontKey, resource: FontResource) -> Arc<FontResource> {
        self.entries
            .write()
            .entry(key)
            .or_insert_with(|| Arc::new(resource))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

pub struct FontResolver {
    catalog: FontCatalog,
    loader: Box<dyn FontLoader>,
    cache: Arc<FontCache>,
}

static GLOBAL_RESOLVER: OnceLock<Arc<FontResolver>> = OnceLock::new();

impl FontResolver {
    pub fn new(catalog: FontCatalog, loader: impl FontLoader + 'static) -> Self {
        Self {
            catalog,
            loader: Box::new(loader),
            cache: Arc::new(FontCache::new()),
        }
    }

    /// Filesystem-backed resolver over `catalog`.
    pub fn with_catalog(catalog: FontCatalog) -> Self {
        Self::new(catalog, FsFontLoader)
    }

    /// Share `cache` with other resolvers instead of owning a fresh one.
    pub fn with_cache(mut self, cache: Arc<FontCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Process-wide resolver over the default catalog.
    pub fn global() -> Arc<FontResolver> {
        GLOBAL_RESOLVER
            .get_or_init(|| Arc::new(FontResolver::with_catalog(FontCatalog::default())))
            .clone()
    }

    pub fn cache(&self) -> &Arc<FontCache> {
        &self.cache
    }

    pub fn catalog(&self) -> &FontCatalog {
        &self.catalog
    }

    pub fn resolve(&self, family: &str, size: u32) -> Arc<FontResource> {
        let size = size.max(1);
        let key = FontKey::new(family, size);

        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let selected = select_face(&self.catalog, family, self.loader.as_ref());
        let resource = match selected.face {
            Some(face) => FontResource {
                stage: selected.stage,
                ..FontResource::outline(family, size, face, selected.path)
            },
            None => FontResource::builtin(family, size),
        };

        match resource.stage {
            ResolutionStage::Exact => debug!(
                family,
                size,
                stage = resource.stage.as_str(),
                path = ?resource.path,
                "Resolved font"
            ),
            ResolutionStage::FamilyFallback => warn!(
                family,
                size,
                stage = resource.stage.as_str(),
                path = ?resource.path,
                "Font family not found, using fallback font"
            ),
            ResolutionStage::Builtin => warn!(
                family,
                size,
                stage = resource.stage.as_str(),
                "No font file could be loaded, using built-in bitmap font"
            ),
        }

        self.cache.insert_if_absent(key, resource)
    }
}
