use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Path of the caption file that sits next to `image`.
pub fn sidecar_path(image: &Path, extension: &str) -> PathBuf {
    image.with_extension(extension)
}

/// Read the caption for `image`, if one exists.
///
/// Invalid UTF-8 is decoded lossily. Returns `None` for a missing,
/// unreadable or blank file.
pub fn read_sidecar(image: &Path, extension: &str) -> Option<String> {
    let path = sidecar_path(image, extension);
    if !path.is_file() {
        return None;
    }

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not read sidecar {:?}: {}", path, e);
            return None;
        }
    };

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!("Sidecar {:?} is not valid UTF-8, decoding lossily", path);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Sidecar text if present, otherwise the configured default.
pub fn caption_for(image: &Path, extension: &str, default_text: Option<&str>) -> Option<String> {
    read_sidecar(image, extension).or_else(|| {
        default_text
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    })
}
