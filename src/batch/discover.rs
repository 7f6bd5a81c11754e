use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions picked up by a batch run, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

pub fn is_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Recursively collect the images under `input`, sorted.
///
/// Files under `exclude` are skipped so that an output directory nested in
/// the input is never fed back into the batch. Paths that only differ in
/// case are returned once.
pub fn discover_images(input: &Path, exclude: Option<&Path>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for entry in WalkDir::new(input).min_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {:?}: {}", input, e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if let Some(exclude) = exclude
            && path.starts_with(exclude)
        {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if name.starts_with('.') || !is_image(name) {
            continue;
        }

        let key = path.to_string_lossy().to_lowercase();
        if seen.insert(key) {
            images.push(path.to_path_buf());
        } else {
            debug!("Duplicate path differing only by case: {:?}", path);
        }
    }

    images.sort();
    images
}
