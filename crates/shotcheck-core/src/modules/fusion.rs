//! Score fusion.
//!
//! Combines the four analyzer records into one graded verdict. Fusion is a
//! pure function of its inputs.

use serde::{Deserialize, Serialize};

use crate::domain::{
    AestheticResult, FramingResult, FusedVerdict, Grade, LightingResult, SharpnessResult,
};

const EXCELLENT_HEADLINE: &str = "Great product image! You're ready to post.";
const GOOD_HEADLINE: &str = "Good image. A few improvements could make it pop.";
const NEEDS_WORK_HEADLINE: &str = "This photo needs work. Check lighting, blur, or background.";

/// Sharpness score that maps to a full sharpness term.
const SHARPNESS_SATURATION: f64 = 100.0;
const LIGHTING_PENALTY: f64 = 0.2;
const CENTERING_BONUS: f64 = 0.1;

const SHARP_POINTS: f64 = 25.0;
const LIGHTING_POINTS: f64 = 25.0;
const FRAMING_POINTS: f64 = 20.0;
const AESTHETIC_POINTS: f64 = 30.0;

/// How analyzer records are combined into a verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionStrategy {
    /// Continuous sharpness plus aesthetic confidence, adjusted by lighting
    /// and framing, halved and clamped to `[0, 1]`.
    #[default]
    WeightedAverage,
    /// Fixed points per passed check plus up to 30 for aesthetics.
    PointAllocation,
}

impl FusionStrategy {
    /// Fuses analyzer records into a verdict.
    #[must_use]
    pub fn fuse(
        self,
        sharpness: &SharpnessResult,
        lighting: &LightingResult,
        framing: &FramingResult,
        aesthetic: &AestheticResult,
    ) -> FusedVerdict {
        let (final_score, grade) = match self {
            Self::WeightedAverage => {
                let score01 = weighted_average(sharpness, lighting, framing, aesthetic);
                let grade = if score01 > 0.85 {
                    Grade::Excellent
                } else if score01 > 0.6 {
                    Grade::Good
                } else {
                    Grade::NeedsImprovement
                };
                (score01 * 100.0, grade)
            }
            Self::PointAllocation => {
                let points = point_allocation(sharpness, lighting, framing, aesthetic);
                let grade = if points >= 85.0 {
                    Grade::Excellent
                } else if points >= 60.0 {
                    Grade::Good
                } else {
                    Grade::NeedsImprovement
                };
                ((points * 10.0).round() / 10.0, grade)
            }
        };

        let checks = [
            format!("- Blur Check: {}", sharpness.feedback),
            format!("- Lighting: {}", lighting.feedback),
            format!("- Framing: {}", framing.feedback),
            format!("- Aesthetic: {}", aesthetic.feedback),
        ]
        .join("\n");
        let summary = match self {
            Self::WeightedAverage => format!("{}\n{checks}", headline(grade)),
            Self::PointAllocation => checks,
        };

        FusedVerdict {
            strategy: self,
            final_score,
            grade,
            summary,
        }
    }
}

impl std::fmt::Display for FusionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WeightedAverage => write!(f, "weighted-average"),
            Self::PointAllocation => write!(f, "point-allocation"),
        }
    }
}

const fn headline(grade: Grade) -> &'static str {
    match grade {
        Grade::Excellent => EXCELLENT_HEADLINE,
        Grade::Good => GOOD_HEADLINE,
        Grade::NeedsImprovement => NEEDS_WORK_HEADLINE,
    }
}

/// Score in `[0, 1]`. Divides the raw sum before clamping, so a raw total
/// above 2 still saturates at 1.
fn weighted_average(
    sharpness: &SharpnessResult,
    lighting: &LightingResult,
    framing: &FramingResult,
    aesthetic: &AestheticResult,
) -> f64 {
    let sharp = (sharpness.score / SHARPNESS_SATURATION).min(1.0);
    let penalty = if lighting.is_poorly_lit() {
        LIGHTING_PENALTY
    } else {
        0.0
    };
    let bonus = if framing.is_centered {
        CENTERING_BONUS
    } else {
        0.0
    };
    let raw = sharp + aesthetic.score + bonus - penalty;
    (raw / 2.0).clamp(0.0, 1.0)
}

/// Points in `[0, 100]`, unrounded.
fn point_allocation(
    sharpness: &SharpnessResult,
    lighting: &LightingResult,
    framing: &FramingResult,
    aesthetic: &AestheticResult,
) -> f64 {
    let mut points = 0.0;
    if !sharpness.is_blurry {
        points += SHARP_POINTS;
    }
    if !lighting.is_poorly_lit() {
        points += LIGHTING_POINTS;
    }
    if framing.is_centered {
        points += FRAMING_POINTS;
    }
    points += (aesthetic.score * AESTHETIC_POINTS).min(AESTHETIC_POINTS);
    f64::min(points, 100.0)
}
