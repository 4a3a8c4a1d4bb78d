//! Framing analysis module.
//!
//! Locates the dominant foreground object and checks that its center lies
//! within a tolerance band around the frame center. Subject detection sits
//! behind [`SubjectDetector`] so the contour heuristic can be swapped for a
//! learned detector without touching the centering rule.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::otsu_level;
use tracing::debug;

use super::sharpness::reflect101;
use crate::domain::{BoundingBox, FramingResult, ImageInfo, Point, QaError, QaModule};

const CENTERED_FEEDBACK: &str = "Object appears well-centered.";
const OFF_CENTER_FEEDBACK: &str = "Object is off-center. Try positioning it closer to the middle.";
const NO_OBJECT_FEEDBACK: &str = "Could not detect object. Try using a plain background.";

/// Normalized 5-tap binomial kernel, the 5x5 Gaussian applied separably.
const GAUSSIAN_5: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Mean luminance above which the scene is treated as light-background.
const LIGHT_BACKGROUND_MEAN: f64 = 127.0;

/// Capability that finds the main subject of a frame.
pub trait SubjectDetector: Send + Sync {
    /// Returns the subject's bounding box, or `None` if nothing was found.
    fn detect_subject_region(&self, luma: &GrayImage) -> Option<BoundingBox>;
}

/// Largest-contour subject detector.
///
/// Smooths, binarizes with Otsu's level, inverts the mask on light scenes so
/// the darker object becomes foreground, then keeps the outer contour with the
/// largest enclosed area.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContourSubjectDetector;

impl SubjectDetector for ContourSubjectDetector {
    fn detect_subject_region(&self, luma: &GrayImage) -> Option<BoundingBox> {
        let smoothed = gaussian_blur_5(luma);
        let level = otsu_level(&smoothed);
        let invert = mean_luma(luma) > LIGHT_BACKGROUND_MEAN;
        debug!(level, invert, "binarizing for subject detection");

        let mask = GrayImage::from_fn(smoothed.width(), smoothed.height(), |x, y| {
            let foreground = (smoothed.get_pixel(x, y).0[0] > level) != invert;
            image::Luma([if foreground { 255 } else { 0 }])
        });

        let contours: Vec<Contour<u32>> = find_contours(&mask);
        let mut best: Option<(&Contour<u32>, f64)> = None;
        for contour in contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        {
            let area = contour_area(contour);
            if best.map_or(true, |(_, best_area)| area > best_area) {
                best = Some((contour, area));
            }
        }

        let (contour, area) = best?;
        let bbox = bounding_rect(contour)?;
        debug!(area, ?bbox, "subject contour selected");
        Some(bbox)
    }
}

/// Separable 5x5 binomial blur with reflect-101 borders, rounded to nearest.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
fn gaussian_blur_5(luma: &GrayImage) -> GrayImage {
    let (width, height) = luma.dimensions();
    let (w, h) = (i64::from(width), i64::from(height));
    let idx = |x: u32, y: u32| y as usize * width as usize + x as usize;

    let mut rows = vec![0.0f32; width as usize * height as usize];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0f32;
            for (k, weight) in GAUSSIAN_5.iter().enumerate() {
                let sx = reflect101(i64::from(x) + k as i64 - 2, w);
                acc += weight * f32::from(luma.get_pixel(sx, y).0[0]);
            }
            rows[idx(x, y)] = acc;
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let mut acc = 0.0f32;
        for (k, weight) in GAUSSIAN_5.iter().enumerate() {
            let sy = reflect101(i64::from(y) + k as i64 - 2, h);
            acc += weight * rows[idx(x, sy)];
        }
        image::Luma([acc.round().clamp(0.0, 255.0) as u8])
    })
}

/// Configuration for framing analysis.
#[derive(Debug, Clone)]
pub struct FramingConfig {
    /// Allowed center offset as a fraction of width (x) and height (y).
    pub margin_ratio: f64,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self { margin_ratio: 0.2 }
    }
}

/// Framing QA module.
pub struct FramingModule {
    config: FramingConfig,
    detector: Box<dyn SubjectDetector>,
}

impl FramingModule {
    /// Creates a framing module using the contour detector.
    #[must_use]
    pub fn new(config: FramingConfig) -> Self {
        Self::with_detector(config, Box::new(ContourSubjectDetector))
    }

    /// Creates a framing module with a custom subject detector.
    #[must_use]
    pub fn with_detector(config: FramingConfig, detector: Box<dyn SubjectDetector>) -> Self {
        Self { config, detector }
    }

    /// Returns the module configuration.
    #[must_use]
    pub const fn config(&self) -> &FramingConfig {
        &self.config
    }

    fn is_within_margin(&self, object: Point, center: Point, width: u32, height: u32) -> bool {
        let dx = f64::from(object.x.abs_diff(center.x));
        let dy = f64::from(object.y.abs_diff(center.y));
        let margin_w = f64::from(width) * self.config.margin_ratio;
        let margin_h = f64::from(height) * self.config.margin_ratio;
        dx <= margin_w && dy <= margin_h
    }
}

impl Default for FramingModule {
    fn default() -> Self {
        Self::new(FramingConfig::default())
    }
}

impl QaModule for FramingModule {
    type Output = FramingResult;

    fn name(&self) -> &'static str {
        "framing"
    }

    fn analyze(&self, image: &ImageInfo) -> Result<FramingResult, QaError> {
        let luma = image.checked_luma8()?;

        let Some(bbox) = self.detector.detect_subject_region(&luma) else {
            debug!("no subject detected");
            return Ok(FramingResult {
                is_centered: false,
                object_center: None,
                image_center: None,
                subject_bbox: None,
                feedback: NO_OBJECT_FEEDBACK.to_string(),
            });
        };

        let (width, height) = luma.dimensions();
        let object_center = bbox.center();
        let image_center = Point::new(width / 2, height / 2);
        let is_centered = self.is_within_margin(object_center, image_center, width, height);
        debug!(?object_center, ?image_center, is_centered, "framing analyzed");

        let feedback = if is_centered {
            CENTERED_FEEDBACK
        } else {
            OFF_CENTER_FEEDBACK
        };

        Ok(FramingResult {
            is_centered,
            object_center: Some(object_center),
            image_center: Some(image_center),
            subject_bbox: Some(bbox),
            feedback: feedback.to_string(),
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_luma(luma: &GrayImage) -> f64 {
    let total = u64::from(luma.width()) * u64::from(luma.height());
    if total == 0 {
        return 0.0;
    }
    let sum: u64 = luma.pixels().map(|p| u64::from(p.0[0])).sum();
    sum as f64 / total as f64
}

/// Enclosed area of a traced border (shoelace formula over the point chain).
#[allow(clippy::cast_precision_loss)]
fn contour_area(contour: &Contour<u32>) -> f64 {
    let points = &contour.points;
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| {
            i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y)
        })
        .sum();
    twice.abs() as f64 / 2.0
}

fn bounding_rect(contour: &Contour<u32>) -> Option<BoundingBox> {
    let min_x = contour.points.iter().map(|p| p.x).min()?;
    let max_x = contour.points.iter().map(|p| p.x).max()?;
    let min_y = contour.points.iter().map(|p| p.y).min()?;
    let max_y = contour.points.iter().map(|p| p.y).max()?;
    Some(BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}
