//! QA module trait shared by the four analyzers.

use super::{ImageInfo, QaError};

/// Trait for implementing quality assessment modules.
///
/// Each module inspects one quality axis of an image and returns its own
/// result record. Modules never mutate the image and hold no per-image state,
/// so one instance may serve any number of assessments.
pub trait QaModule: Send + Sync {
    /// Result record produced by this module.
    type Output;

    /// Returns the name of this QA module.
    fn name(&self) -> &'static str;

    /// Analyzes an image.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::InvalidInput`] for unusable images, or
    /// [`QaError::ModelUnavailable`] when a model-backed module cannot run.
    fn analyze(&self, image: &ImageInfo) -> Result<Self::Output, QaError>;
}
