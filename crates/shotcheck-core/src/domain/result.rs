//! Per-axis result records and the fused verdict.

use serde::{Deserialize, Serialize};

/// Integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingBox {
    /// Geometric center, truncating odd extents.
    #[must_use]
    pub const fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// Focus measure from the Laplacian variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharpnessResult {
    /// Variance of the Laplacian response (always `>= 0`).
    pub score: f64,
    /// `score < threshold`.
    pub is_blurry: bool,
    /// Human-readable feedback.
    pub feedback: String,
}

/// Exposure measure from the brightness histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingResult {
    /// Mean luminance in `[0, 255]`.
    pub mean_brightness: f64,
    /// Too many pixels below the low cutoff.
    pub is_dark: bool,
    /// Too many pixels above the high cutoff.
    pub is_bright: bool,
    /// Fraction of pixels strictly below the low cutoff.
    pub dark_ratio: f64,
    /// Fraction of pixels strictly above the high cutoff.
    pub bright_ratio: f64,
    /// Human-readable feedback.
    pub feedback: String,
}

impl LightingResult {
    /// True when either exposure flag tripped.
    #[must_use]
    pub const fn is_poorly_lit(&self) -> bool {
        self.is_dark || self.is_bright
    }
}

/// Subject placement relative to the frame center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramingResult {
    /// Subject center within tolerance on both axes.
    pub is_centered: bool,
    /// Center of the subject's bounding box; absent when nothing was detected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_center: Option<Point>,
    /// Center of the frame; absent when nothing was detected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_center: Option<Point>,
    /// Bounding box of the detected subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_bbox: Option<BoundingBox>,
    /// Human-readable feedback.
    pub feedback: String,
}

impl FramingResult {
    /// Whether a subject was found at all.
    #[must_use]
    pub const fn object_detected(&self) -> bool {
        self.object_center.is_some()
    }
}

/// Best-matching quality description for the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AestheticResult {
    /// Prompt with the highest probability.
    pub best_prompt: String,
    /// Probability of `best_prompt`, in `[0, 1]`.
    pub score: f64,
    /// Softmax distribution over the whole prompt bank, in bank order.
    pub probabilities: Vec<f64>,
    /// Human-readable feedback.
    pub feedback: String,
}

/// Verdict tier.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    /// Positive tier.
    Excellent,
    /// Middle tier.
    Good,
    /// Negative tier.
    NeedsImprovement,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsImprovement => "Needs Improvement",
        };
        f.write_str(label)
    }
}

/// Combined verdict produced by a fusion strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedVerdict {
    /// Strategy that produced this verdict.
    pub strategy: crate::modules::FusionStrategy,
    /// Overall score in `[0, 100]`.
    pub final_score: f64,
    /// Verdict tier.
    pub grade: Grade,
    /// Multi-line summary.
    pub summary: String,
}

/// Everything produced for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Focus result.
    pub sharpness: SharpnessResult,
    /// Exposure result.
    pub lighting: LightingResult,
    /// Framing result.
    pub framing: FramingResult,
    /// Aesthetic result.
    pub aesthetic: AestheticResult,
    /// Fused verdict.
    pub verdict: FusedVerdict,
}

/// Image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageDimensions {
    /// Creates a dimensions record.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Assessment of one image file, as emitted to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Path to the assessed image.
    pub path: String,
    /// Timestamp of the assessment (RFC 3339).
    pub timestamp: String,
    /// Image dimensions.
    pub dimensions: ImageDimensions,
    /// Results and verdict.
    #[serde(flatten)]
    pub assessment: Assessment,
}
