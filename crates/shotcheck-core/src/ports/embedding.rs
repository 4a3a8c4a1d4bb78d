//! Embedding service port for vision-language models.

use image::DynamicImage;

use crate::domain::QaError;

/// Port for a joint image/text embedding model.
///
/// Implementations must return L2-normalized vectors of one fixed dimension
/// so that a dot product is a cosine similarity. Embedding is inference-only:
/// calls take `&self` and must not change model parameters, which makes one
/// instance safe to share across threads behind an `Arc`.
pub trait EmbeddingService: Send + Sync {
    /// Embeds one image.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::ModelUnavailable`] if the model cannot be loaded or run.
    fn embed_image(&self, image: &DynamicImage) -> Result<Vec<f32>, QaError>;

    /// Embeds a batch of texts, one vector per input in input order.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::ModelUnavailable`] if the model cannot be loaded or run.
    fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, QaError>;
}
