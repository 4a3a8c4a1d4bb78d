//! Lighting analysis module.
//!
//! Flags under- and overexposure from the share of luminance values that
//! fall below a shadow cutoff or above a highlight cutoff.

use tracing::debug;

use crate::domain::{ImageInfo, LightingResult, QaError, QaModule};

const DARK_FEEDBACK: &str = "Image is too dark. Try using better lighting or increasing exposure.";
const BRIGHT_FEEDBACK: &str =
    "Image is overexposed. Consider reducing brightness or avoiding direct light.";
const GOOD_FEEDBACK: &str = "Lighting looks good.";

/// Configuration for lighting analysis.
#[derive(Debug, Clone)]
pub struct LightingConfig {
    /// Pixels strictly below this luminance count as dark.
    pub low_thresh: u8,
    /// Pixels strictly above this luminance count as bright.
    pub high_thresh: u8,
    /// Dark fraction above which the image is flagged dark.
    pub dark_pct_limit: f64,
    /// Bright fraction above which the image is flagged bright.
    pub bright_pct_limit: f64,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            low_thresh: 40,
            high_thresh: 200,
            dark_pct_limit: 0.5,
            bright_pct_limit: 0.5,
        }
    }
}

/// 256-bin histogram of luminance values.
#[derive(Debug, Clone)]
pub struct Histogram {
    bins: [u64; 256],
    total: u64,
}

impl Histogram {
    /// Compute histogram from grayscale image.
    #[must_use]
    pub fn from_luma(image: &image::GrayImage) -> Self {
        let mut bins = [0u64; 256];
        for pixel in image.pixels() {
            bins[usize::from(pixel.0[0])] += 1;
        }
        let total = bins.iter().sum();
        Self { bins, total }
    }

    /// Returns the total pixel count.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Returns the count in one bin.
    #[must_use]
    pub const fn count(&self, level: u8) -> u64 {
        self.bins[level as usize]
    }

    /// Calculate mean luminance.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let sum: u64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(i, &count)| (i as u64) * count)
            .sum();
        sum as f64 / self.total as f64
    }

    /// Count pixels strictly below a threshold.
    #[must_use]
    pub fn count_below(&self, threshold: u8) -> u64 {
        self.bins[..usize::from(threshold)].iter().sum()
    }

    /// Count pixels strictly above a threshold.
    #[must_use]
    pub fn count_above(&self, threshold: u8) -> u64 {
        self.bins[usize::from(threshold) + 1..].iter().sum()
    }

    /// Fraction of pixels strictly below threshold.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fraction_below(&self, threshold: u8) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count_below(threshold) as f64 / self.total as f64
    }

    /// Fraction of pixels strictly above threshold.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fraction_above(&self, threshold: u8) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count_above(threshold) as f64 / self.total as f64
    }
}

/// Lighting QA module.
pub struct LightingModule {
    config: LightingConfig,
}

impl LightingModule {
    /// Creates a new lighting module with the given configuration.
    #[must_use]
    pub const fn new(config: LightingConfig) -> Self {
        Self { config }
    }

    /// Returns the module configuration.
    #[must_use]
    pub const fn config(&self) -> &LightingConfig {
        &self.config
    }
}

impl Default for LightingModule {
    fn default() -> Self {
        Self::new(LightingConfig::default())
    }
}

impl QaModule for LightingModule {
    type Output = LightingResult;

    fn name(&self) -> &'static str {
        "lighting"
    }

    fn analyze(&self, image: &ImageInfo) -> Result<LightingResult, QaError> {
        let luma = image.checked_luma8()?;
        let histogram = Histogram::from_luma(&luma);

        let mean_brightness = histogram.mean();
        let dark_ratio = histogram.fraction_below(self.config.low_thresh);
        let bright_ratio = histogram.fraction_above(self.config.high_thresh);

        let is_dark = dark_ratio > self.config.dark_pct_limit;
        let is_bright = bright_ratio > self.config.bright_pct_limit;
        debug!(
            mean_brightness,
            dark_ratio, bright_ratio, is_dark, is_bright, "lighting analyzed"
        );

        // Dark wins when both flags trip.
        let feedback = if is_dark {
            DARK_FEEDBACK
        } else if is_bright {
            BRIGHT_FEEDBACK
        } else {
            GOOD_FEEDBACK
        };

        Ok(LightingResult {
            mean_brightness,
            is_dark,
            is_bright,
            dark_ratio,
            bright_ratio,
            feedback: feedback.to_string(),
        })
    }
}
