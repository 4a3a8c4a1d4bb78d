//! Filesystem image loading.

use std::path::Path;

use anyhow::{bail, Context, Result};
use shotcheck_core::ImageInfo;
use tracing::debug;

/// Extensions accepted by [`load_image`].
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tif", "tiff"];

/// Checks if a path has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

/// Decodes an image file.
///
/// # Errors
///
/// Returns an error if the path does not exist, has an unsupported extension,
/// or cannot be decoded.
pub fn load_image(path: &Path) -> Result<ImageInfo> {
    if !path.is_file() {
        bail!("no such image file: {}", path.display());
    }
    if !is_supported_image(path) {
        bail!(
            "unsupported image type: {} (expected one of {})",
            path.display(),
            IMAGE_EXTENSIONS.join(", ")
        );
    }

    let image =
        image::open(path).with_context(|| format!("failed to decode {}", path.display()))?;
    let info = ImageInfo::new(path.to_string_lossy(), image);
    debug!(path = %path.display(), width = info.width, height = info.height, "image loaded");
    Ok(info)
}
