//! Analyzers and score fusion.
//!
//! Each analyzer implements `QaModule` and produces one typed record;
//! `FusionStrategy` folds the four records into a verdict.

mod aesthetic;
mod framing;
mod fusion;
mod lighting;
mod sharpness;

pub use aesthetic::{
    AestheticModule, PromptBank, DEFAULT_FEEDBACK, DEFAULT_PROMPTS, DEFAULT_TEMPERATURE,
    FALLBACK_FEEDBACK,
};
pub use framing::{ContourSubjectDetector, FramingConfig, FramingModule, SubjectDetector};
pub use fusion::FusionStrategy;
pub use lighting::{Histogram, LightingConfig, LightingModule};
pub use sharpness::{laplacian_variance, SharpnessConfig, SharpnessModule};
