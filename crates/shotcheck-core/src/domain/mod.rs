//! Core domain types for product photo assessment.

mod error;
mod image_info;
mod qa_module;
mod result;

pub use error::QaError;
pub use image_info::ImageInfo;
pub use qa_module::QaModule;
pub use result::{
    AestheticResult, Assessment, BoundingBox, FramingResult, FusedVerdict, Grade, ImageDimensions,
    LightingResult, Point, Report, SharpnessResult,
};
