//! Configuration file support for shotcheck.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/shotcheck/config.toml` (lowest priority)
//! - Project-local: `.shotcheck.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

/// Project-local config file name.
pub const PROJECT_CONFIG: &str = ".shotcheck.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Sharpness settings.
    pub sharpness: SharpnessSection,
    /// Lighting settings.
    pub lighting: LightingSection,
    /// Framing settings.
    pub framing: FramingSection,
    /// Aesthetic prompt bank.
    pub aesthetic: AestheticSection,
    /// Fusion settings.
    pub fusion: FusionSection,
    /// Model settings.
    pub models: ModelsSection,
    /// Output formatting settings.
    pub output: OutputSection,
}

/// `[sharpness]`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SharpnessSection {
    /// Laplacian variance below which an image is blurry.
    pub threshold: Option<f64>,
}

/// `[lighting]`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LightingSection {
    /// Dark luminance cutoff (0-255).
    pub low_thresh: Option<u8>,
    /// Bright luminance cutoff (0-255).
    pub high_thresh: Option<u8>,
    /// Dark fraction limit (0.0-1.0).
    pub dark_pct_limit: Option<f64>,
    /// Bright fraction limit (0.0-1.0).
    pub bright_pct_limit: Option<f64>,
}

/// `[framing]`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FramingSection {
    /// Allowed center offset as a fraction of each dimension.
    pub margin_ratio: Option<f64>,
}

/// `[aesthetic]`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AestheticSection {
    /// Quality descriptions to match against.
    pub prompts: Option<Vec<String>>,
    /// Feedback for each prompt, in the same order.
    pub feedback: Option<Vec<String>>,
}

/// `[fusion]`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FusionSection {
    /// `weighted_average` or `point_allocation`.
    pub strategy: Option<String>,
}

/// `[models]`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsSection {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
}

/// `[output]`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// `json` or `text`.
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
}

impl AppConfig {
    /// Loads XDG and project-local configuration.
    ///
    /// Missing files are skipped; unreadable or unparseable files are skipped
    /// with a warning; out-of-range values are dropped with a warning.
    pub fn load() -> Self {
        let cwd = std::env::current_dir().ok();
        Self::load_from(xdg_config_path().as_deref(), cwd.as_deref())
    }

    /// Like [`AppConfig::load`] with explicit search roots.
    pub fn load_from(xdg_path: Option<&Path>, cwd: Option<&Path>) -> Self {
        let mut config = Self::default();

        if let Some(path) = xdg_path {
            if path.is_file() {
                info!(path = %path.display(), "loading user config");
                if let Some(user) = load_file(path) {
                    config = user;
                }
            } else {
                debug!(path = %path.display(), "no user config");
            }
        }

        if let Some(path) = cwd.and_then(find_config_in_parents) {
            info!(path = %path.display(), "loading project config");
            if let Some(project) = load_file(&path) {
                config.merge(project);
            }
        }

        for problem in config.sanitize() {
            eprintln!("warning: {problem}");
        }

        config
    }

    /// Drops out-of-range values, returning one message per dropped key.
    fn sanitize(&mut self) -> Vec<String> {
        let mut problems = Vec::new();

        if let Some(t) = self.sharpness.threshold {
            if !t.is_finite() || t < 0.0 {
                problems.push(format!("sharpness.threshold must be >= 0, got {t}"));
                self.sharpness.threshold = None;
            }
        }

        for (key, slot) in [
            ("lighting.dark_pct_limit", &mut self.lighting.dark_pct_limit),
            ("lighting.bright_pct_limit", &mut self.lighting.bright_pct_limit),
            ("framing.margin_ratio", &mut self.framing.margin_ratio),
        ] {
            if let Some(v) = *slot {
                if !(0.0..=1.0).contains(&v) {
                    problems.push(format!("{key} must be 0.0-1.0, got {v}"));
                    *slot = None;
                }
            }
        }

        if let (Some(low), Some(high)) = (self.lighting.low_thresh, self.lighting.high_thresh) {
            if low > high {
                problems.push(format!(
                    "lighting.low_thresh ({low}) must not exceed lighting.high_thresh ({high})"
                ));
                self.lighting.low_thresh = None;
                self.lighting.high_thresh = None;
            }
        }

        if self.aesthetic.prompts.as_ref().is_some_and(Vec::is_empty) {
            problems.push("aesthetic.prompts must not be empty".to_string());
            self.aesthetic.prompts = None;
        }

        if let Some(s) = &self.fusion.strategy {
            if s != "weighted_average" && s != "point_allocation" {
                problems.push(format!(
                    "fusion.strategy must be 'weighted_average' or 'point_allocation', got '{s}'"
                ));
                self.fusion.strategy = None;
            }
        }

        if let Some(f) = &self.output.format {
            if f != "json" && f != "text" {
                problems.push(format!("output.format must be 'json' or 'text', got '{f}'"));
                self.output.format = None;
            }
        }

        problems
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        self.sharpness.threshold = other.sharpness.threshold.or(self.sharpness.threshold);

        let l = &mut self.lighting;
        l.low_thresh = other.lighting.low_thresh.or(l.low_thresh);
        l.high_thresh = other.lighting.high_thresh.or(l.high_thresh);
        l.dark_pct_limit = other.lighting.dark_pct_limit.or(l.dark_pct_limit);
        l.bright_pct_limit = other.lighting.bright_pct_limit.or(l.bright_pct_limit);

        self.framing.margin_ratio = other.framing.margin_ratio.or(self.framing.margin_ratio);

        // Prompts and feedback travel together.
        if other.aesthetic.prompts.is_some() {
            self.aesthetic = other.aesthetic;
        } else if other.aesthetic.feedback.is_some() {
            self.aesthetic.feedback = other.aesthetic.feedback;
        }

        self.fusion.strategy = other.fusion.strategy.or_else(|| self.fusion.strategy.take());
        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("shotcheck").join("config.toml"))
}

/// Search for `.shotcheck.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_CONFIG))
        .find(|path| path.is_file())
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("failed to read config file {}: {e}", path.display());
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("warning: ignoring {}: {e}", path.display());
            None
        }
    }
}
