//! Candidate font paths per family.
//!
//! The table is plain data: an ordered list of paths per family alias, plus a
//! generic fallback list tried when the family has no loadable candidate.
//! [`select_face`] walks it through a [`FontLoader`], so selection can be
//! exercised without touching the filesystem.

use ab_glyph::FontArc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const TIMES_CANDIDATES: &[&str] = &[
    // Windows
    "C:/Windows/Fonts/times.ttf",
    "C:/Windows/Fonts/Times.ttf",
    "C:/Windows/Fonts/timesnewroman.ttf",
    "C:/Windows/Fonts/TimesNewRoman.ttf",
    // Linux
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf",
    "/usr/share/fonts/truetype/times/Times-Roman.ttf",
    // macOS
    "/Library/Fonts/Times New Roman.ttf",
    "/System/Library/Fonts/Times.ttc",
];

const INTER_CANDIDATES: &[&str] = &[
    "C:/Windows/Fonts/Inter-Regular.ttf",
    "C:/Windows/Fonts/inter.ttf",
    "/usr/share/fonts/truetype/inter/Inter-Regular.ttf",
    "/usr/share/fonts/Inter-Regular.ttf",
    "/Library/Fonts/Inter-Regular.ttf",
    "/System/Library/Fonts/Inter-Regular.ttf",
    // Bundled next to the binary
    "fonts/Inter-Regular.ttf",
    "./Inter-Regular.ttf",
];

const GENERIC_FALLBACKS: &[&str] = &[
    "C:/Windows/Fonts/times.ttf",
    "C:/Windows/Fonts/arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "static/DejaVuSans.ttf",
];

/// Which step of the fallback chain produced a font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStage {
    /// A candidate of the requested family loaded.
    Exact,
    /// The family had no loadable candidate; a generic fallback loaded.
    FamilyFallback,
    /// Nothing on disk loaded; the built-in bitmap face is used.
    Builtin,
}

impl ResolutionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStage::Exact => "exact",
            ResolutionStage::FamilyFallback => "family-fallback",
            ResolutionStage::Builtin => "builtin",
        }
    }
}

/// Reads raw font bytes. Returns `None` for anything that is missing or
/// unreadable so the caller can move on to the next candidate.
pub trait FontLoader: Send + Sync {
    fn load(&self, path: &Path) -> Option<Vec<u8>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FsFontLoader;

impl FontLoader for FsFontLoader {
    fn load(&self, path: &Path) -> Option<Vec<u8>> {
        if !path.is_file() {
            return None;
        }
        match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!("Failed to read font file {:?}: {}", path, e);
                None
            }
        }
    }
}

/// User additions to the built-in table, as found in the config file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FontCatalogConfig {
    /// Extra candidates per family, tried before the built-in list.
    #[serde(default)]
    pub families: HashMap<String, Vec<PathBuf>>,
    /// Extra generic fallbacks, tried after the built-in list.
    #[serde(default)]
    pub fallbacks: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct FontCatalog {
    families: HashMap<String, Vec<PathBuf>>,
    fallbacks: Vec<PathBuf>,
}

impl Default for FontCatalog {
    fn default() -> Self {
        let to_paths = |list: &[&str]| list.iter().map(PathBuf::from).collect::<Vec<_>>();

        let mut families = HashMap::new();
        families.insert("times new roman".to_string(), to_paths(TIMES_CANDIDATES));
        families.insert("times".to_string(), to_paths(TIMES_CANDIDATES));
        families.insert("inter".to_string(), to_paths(INTER_CANDIDATES));

        Self {
            families,
            fallbacks: to_paths(GENERIC_FALLBACKS),
        }
    }
}

impl FontCatalog {
    /// An empty table; every lookup goes straight to the built-in face.
    pub fn empty() -> Self {
        Self {
            families: HashMap::new(),
            fallbacks: Vec::new(),
        }
    }

    pub fn from_config(config: &FontCatalogConfig) -> Self {
        let mut catalog = Self::default();
        for (family, paths) in &config.families {
            let entry = catalog.families.entry(normalize_family(family)).or_default();
            let mut merged = paths.clone();
            merged.append(entry);
            *entry = merged;
        }
        catalog.fallbacks.extend(config.fallbacks.iter().cloned());
        catalog
    }

    pub fn with_family<I, P>(mut self, family: &str, candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.families.insert(
            normalize_family(family),
            candidates.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn with_fallbacks<I, P>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.fallbacks = candidates.into_iter().map(Into::into).collect();
        self
    }

    pub fn candidates(&self, family: &str) -> &[PathBuf] {
        self.families
            .get(&normalize_family(family))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn fallbacks(&self) -> &[PathBuf] {
        &self.fallbacks
    }
}

/// Outcome of walking the catalog for one family.
pub struct SelectedFace {
    pub stage: ResolutionStage,
    pub face: Option<FontArc>,
    pub path: Option<PathBuf>,
}

/// Walk the family's candidates, then the generic fallbacks, returning the
/// first path that loads and parses. `face` is `None` at the builtin stage.
pub fn select_face(catalog: &FontCatalog, family: &str, loader: &dyn FontLoader) -> SelectedFace {
    if let Some((face, path)) = first_loadable(catalog.candidates(family), loader) {
        return SelectedFace {
            stage: ResolutionStage::Exact,
            face: Some(face),
            path: Some(path),
        };
    }

    if let Some((face, path)) = first_loadable(catalog.fallbacks(), loader) {
        return SelectedFace {
            stage: ResolutionStage::FamilyFallback,
            face: Some(face),
            path: Some(path),
        };
    }

    SelectedFace {
        stage: ResolutionStage::Builtin,
        face: None,
        path: None,
    }
}

fn first_loadable(candidates: &[PathBuf], loader: &dyn FontLoader) -> Option<(FontArc, PathBuf)> {
    candidates.iter().find_map(|path| {
        let bytes = loader.load(path)?;
        match FontArc::try_from_vec(bytes) {
            Ok(face) => Some((face, path.clone())),
            Err(_) => {
                debug!("Skipping unparseable font file {:?}", path);
                None
            }
        }
    })
}

pub(crate) fn normalize_family(family: &str) -> String {
    family.trim().to_lowercase()
}
