//! Model download and cache.
//!
//! The CLIP weights and tokenizer are fetched once into a per-user data
//! directory and read from there on every run.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Checksum value that disables verification for an entry.
const PLACEHOLDER_CHECKSUM: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

const CHUNK_SIZE: usize = 64 * 1024;

/// Registry name of the CLIP weights.
pub const CLIP_WEIGHTS: &str = "clip-vit-b32";
/// Registry name of the CLIP tokenizer.
pub const CLIP_TOKENIZER: &str = "clip-vit-b32-tokenizer";

/// Download progress: model name, bytes so far, total if known.
pub type ProgressCallback = Box<dyn Fn(&str, u64, Option<u64>) + Send + Sync>;

/// A downloadable model file.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Registry name.
    pub name: &'static str,
    /// Download URL.
    pub url: &'static str,
    /// Expected SHA-256; all zeros skips verification.
    pub sha256: &'static str,
    /// File name inside the models directory.
    pub filename: &'static str,
}

/// Files the aesthetic analyzer needs.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: CLIP_WEIGHTS,
        url: "https://huggingface.co/openai/clip-vit-base-patch32/resolve/refs%2Fpr%2F15/model.safetensors",
        sha256: PLACEHOLDER_CHECKSUM,
        filename: "clip-vit-b32.safetensors",
    },
    ModelInfo {
        name: CLIP_TOKENIZER,
        url: "https://huggingface.co/openai/clip-vit-base-patch32/resolve/refs%2Fpr%2F15/tokenizer.json",
        sha256: PLACEHOLDER_CHECKSUM,
        filename: "clip-vit-b32-tokenizer.json",
    },
];

/// Default models directory, `$XDG_DATA_HOME/shotcheck/models` or the
/// platform equivalent.
#[must_use]
pub fn models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shotcheck")
        .join("models")
}

/// Path of the named model inside `dir`.
#[must_use]
pub fn model_path_in(dir: &Path, name: &str) -> Option<PathBuf> {
    MODELS
        .iter()
        .find(|m| m.name == name)
        .map(|m| dir.join(m.filename))
}

/// Every registered model with whether it is present in `dir`.
#[must_use]
pub fn list_models_in(dir: &Path) -> Vec<(&'static ModelInfo, bool)> {
    MODELS
        .iter()
        .map(|m| (m, dir.join(m.filename).is_file()))
        .collect()
}

/// Names of models missing from `dir`.
#[must_use]
pub fn missing_models_in(dir: &Path) -> Vec<&'static str> {
    list_models_in(dir)
        .into_iter()
        .filter(|(_, present)| !present)
        .map(|(m, _)| m.name)
        .collect()
}

/// Downloads every model missing from `dir`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, a download fails, or
/// a checksum does not match.
pub fn ensure_models_in(dir: &Path, progress: Option<&ProgressCallback>) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create models directory {}", dir.display()))?;

    for model in MODELS {
        let path = dir.join(model.filename);
        if path.is_file() {
            debug!(model = model.name, "already present");
            continue;
        }
        download_model(model, &path, progress)?;
    }
    Ok(())
}

/// Checks `actual` against the expected hex digest.
///
/// # Errors
///
/// Returns an error on mismatch, unless `expected` is the placeholder.
pub fn verify_checksum(name: &str, expected: &str, actual: &str) -> Result<()> {
    if expected == PLACEHOLDER_CHECKSUM {
        debug!(model = name, "checksum verification skipped");
        return Ok(());
    }
    if !expected.eq_ignore_ascii_case(actual) {
        bail!("checksum mismatch for {name}: expected {expected}, got {actual}");
    }
    Ok(())
}

fn download_model(model: &ModelInfo, path: &Path, progress: Option<&ProgressCallback>) -> Result<()> {
    info!(model = model.name, url = model.url, "downloading");

    let mut response = reqwest::blocking::get(model.url)
        .with_context(|| format!("failed to download {}", model.name))?;
    if !response.status().is_success() {
        bail!("download of {} failed: HTTP {}", model.name, response.status());
    }
    let total = response.content_length();

    // Stream into a sibling file so an interrupted download never looks complete.
    let partial = path.with_extension("part");
    let mut file = fs::File::create(&partial)
        .with_context(|| format!("failed to create {}", partial.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut downloaded = 0u64;

    loop {
        let n = response
            .read(&mut buf)
            .with_context(|| format!("failed to read response for {}", model.name))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        file.write_all(&buf[..n])
            .with_context(|| format!("failed to write {}", partial.display()))?;
        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(model.name, downloaded, total);
        }
    }
    file.flush()?;
    drop(file);

    let digest = format!("{:x}", hasher.finalize());
    if let Err(e) = verify_checksum(model.name, model.sha256, &digest) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    fs::rename(&partial, path)
        .with_context(|| format!("failed to move {} into place", model.name))?;
    info!(model = model.name, bytes = downloaded, "downloaded");
    Ok(())
}
