//! Shotcheck core: product photo assessment.
//!
//! Four analyzers (sharpness, lighting, framing, aesthetic) each produce a
//! typed record; a fusion strategy combines them into a graded verdict.
//! Decoding files and presenting results live in the adapter and CLI crates.

mod assessor;
pub mod domain;
pub mod inference;
pub mod modules;
pub mod ports;

pub use assessor::{Assessor, AssessorConfig};
pub use domain::{
    AestheticResult, Assessment, BoundingBox, FramingResult, FusedVerdict, Grade,
    ImageDimensions, ImageInfo, LightingResult, Point, QaError, QaModule, Report,
    SharpnessResult,
};
pub use inference::ClipEmbedder;
pub use modules::FusionStrategy;
pub use ports::{EmbeddingService, ResultOutput};
