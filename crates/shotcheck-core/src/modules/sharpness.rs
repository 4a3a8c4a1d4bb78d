//! Sharpness analysis module.
//!
//! Measures focus as the variance of the 3x3 Laplacian response over the
//! luminance channel. Defocus and motion blur suppress high frequencies, so a
//! blurred frame has a low variance.

use image::GrayImage;
use tracing::debug;

use crate::domain::{ImageInfo, QaError, QaModule, SharpnessResult};

const SHARP_FEEDBACK: &str = "Image appears sharp.";
const BLURRY_FEEDBACK: &str = "Image looks blurry. Try using a tripod or better focus.";

/// Configuration for sharpness analysis.
#[derive(Debug, Clone)]
pub struct SharpnessConfig {
    /// Laplacian variance below which an image is flagged as blurry.
    pub threshold: f64,
}

impl Default for SharpnessConfig {
    fn default() -> Self {
        Self { threshold: 100.0 }
    }
}

/// Sharpness QA module.
pub struct SharpnessModule {
    config: SharpnessConfig,
}

impl SharpnessModule {
    /// Creates a new sharpness module with the given configuration.
    #[must_use]
    pub const fn new(config: SharpnessConfig) -> Self {
        Self { config }
    }

    /// Returns the module configuration.
    #[must_use]
    pub const fn config(&self) -> &SharpnessConfig {
        &self.config
    }
}

impl Default for SharpnessModule {
    fn default() -> Self {
        Self::new(SharpnessConfig::default())
    }
}

impl QaModule for SharpnessModule {
    type Output = SharpnessResult;

    fn name(&self) -> &'static str {
        "sharpness"
    }

    fn analyze(&self, image: &ImageInfo) -> Result<SharpnessResult, QaError> {
        let luma = image.checked_luma8()?;
        let score = laplacian_variance(&luma);
        let is_blurry = score < self.config.threshold;
        debug!(score, is_blurry, "sharpness analyzed");

        let feedback = if is_blurry {
            BLURRY_FEEDBACK
        } else {
            SHARP_FEEDBACK
        };

        Ok(SharpnessResult {
            score,
            is_blurry,
            feedback: feedback.to_string(),
        })
    }
}

/// Population variance of the Laplacian response over every pixel.
///
/// Kernel `[0 1 0; 1 -4 1; 0 1 0]`; out-of-range neighbours are mirrored
/// without repeating the edge pixel (`dcb|abcd|cba`).
#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
#[must_use]
pub fn laplacian_variance(image: &GrayImage) -> f64 {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let w = i64::from(width);
    let h = i64::from(height);
    let at = |x: i64, y: i64| -> f64 {
        let px = reflect101(x, w);
        let py = reflect101(y, h);
        f64::from(image.get_pixel(px, py).0[0])
    };

    // Welford keeps the running variance stable on large frames.
    let mut count = 0u64;
    let mut mean = 0.0f64;
    let mut m2 = 0.0f64;
    for y in 0..h {
        for x in 0..w {
            let response =
                at(x, y - 1) + at(x, y + 1) + at(x - 1, y) + at(x + 1, y) - 4.0 * at(x, y);
            count += 1;
            let delta = response - mean;
            mean += delta / count as f64;
            m2 += delta * (response - mean);
        }
    }

    (m2 / count as f64).max(0.0)
}

/// Mirrors `i` into `0..len` without repeating the edge pixel, for any offset.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(super) const fn reflect101(i: i64, len: i64) -> u32 {
    if len == 1 {
        return 0;
    }
    let period = 2 * len - 2;
    let mut i = i.rem_euclid(period);
    if i >= len {
        i = period - i;
    }
    i as u32
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::cast_possible_truncation)]
mod tests {
    use super::*;
    use image::{DynamicImage, Luma};

    fn info(img: GrayImage) -> ImageInfo {
        ImageInfo::new("test.png", DynamicImage::ImageLuma8(img))
    }

    #[test]
    fn test_default_config() {
        let config = SharpnessConfig::default();
        assert!((config.threshold - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_module_name() {
        let module = SharpnessModule::default();
        assert_eq!(module.name(), "sharpness");
    }

    #[test]
    fn test_flat_image_scores_zero_and_is_blurry() {
        let img = GrayImage::from_fn(64, 64, |_, _| Luma([128u8]));
        let result = SharpnessModule::default()
            .analyze(&info(img))
            .expect("analysis should succeed");

        assert!(result.score.abs() < f64::EPSILON, "score={}", result.score);
        assert!(result.is_blurry);
        assert_eq!(result.feedback, BLURRY_FEEDBACK);
    }

    #[test]
    fn test_checkerboard_is_sharp() {
        let img = GrayImage::from_fn(64, 64, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        let result = SharpnessModule::default()
            .analyze(&info(img))
            .expect("analysis should succeed");

        assert!(result.score > 1000.0, "score={}", result.score);
        assert!(!result.is_blurry);
        assert_eq!(result.feedback, SHARP_FEEDBACK);
    }

    #[test]
    fn test_gentle_gradient_is_blurry() {
        // Linear ramp: second derivative vanishes away from the borders.
        let img = GrayImage::from_fn(200, 50, |x, _| Luma([x as u8]));
        let result = SharpnessModule::default()
            .analyze(&info(img))
            .expect("analysis should succeed");

        assert!(result.is_blurry, "score={}", result.score);
    }

    #[test]
    fn test_single_bright_pixel_variance() {
        // 3x3 with one bright center pixel: -4v at the center, 2v at the edge
        // midpoints (the mirrored outer neighbour is the center again), 0 at
        // the corners.
        let mut img = GrayImage::new(3, 3);
        img.put_pixel(1, 1, Luma([10u8]));
        let variance = laplacian_variance(&img);

        let values = [0.0, 20.0, 0.0, 20.0, -40.0, 20.0, 0.0, 20.0, 0.0];
        let mean = values.iter().sum::<f64>() / 9.0;
        let expected = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 9.0;
        assert!(
            (variance - expected).abs() < 1e-9,
            "variance={variance} expected={expected}"
        );
    }

    #[test]
    fn test_threshold_is_strict() {
        let img = GrayImage::from_fn(64, 64, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        let score = laplacian_variance(&img);

        // score == threshold is not blurry
        let module = SharpnessModule::new(SharpnessConfig { threshold: score });
        let result = module.analyze(&info(img)).expect("analysis");
        assert!(!result.is_blurry);
    }

    #[test]
    fn test_color_image_is_converted() {
        let img = image::RgbImage::from_fn(32, 32, |x, _| {
            if x < 16 {
                image::Rgb([0, 0, 0])
            } else {
                image::Rgb([255, 255, 255])
            }
        });
        let info = ImageInfo::new("rgb.png", DynamicImage::ImageRgb8(img));
        let result = SharpnessModule::default().analyze(&info).expect("analysis");
        assert!(result.score > 0.0);
    }

    #[test]
    fn test_1x1_image() {
        let img = GrayImage::from_fn(1, 1, |_, _| Luma([42u8]));
        let result = SharpnessModule::default()
            .analyze(&info(img))
            .expect("1x1 image should not cause error");
        assert!(result.score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_image_is_invalid_input() {
        let info = ImageInfo::new("empty.png", DynamicImage::new_luma8(0, 5));
        let err = SharpnessModule::default()
            .analyze(&info)
            .expect_err("empty image must fail");
        assert!(matches!(err, QaError::InvalidInput(_)));
    }

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(2, 5), 2);
        assert_eq!(reflect101(-1, 2), 1);
        assert_eq!(reflect101(2, 2), 0);
        assert_eq!(reflect101(-1, 1), 0);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(3, 2), 1);
        assert_eq!(reflect101(-2, 2), 0);
    }
}
