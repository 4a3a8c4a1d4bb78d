//! Error kinds surfaced by an assessment.

/// Failure of a single assessment.
///
/// An assessment either completes with all four results or fails with one of
/// these; fusion never sees a partial set of results.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum QaError {
    /// The image buffer is empty or otherwise unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The embedding model could not be loaded or failed during inference.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
}

impl QaError {
    /// Wraps any displayable error as [`QaError::ModelUnavailable`].
    pub fn model(err: impl std::fmt::Display) -> Self {
        Self::ModelUnavailable(format!("{err:#}"))
    }
}
