//! Aesthetic scoring module.
//!
//! Compares an image embedding against a bank of textual quality
//! descriptions and reports the best match with its softmax probability.

use std::sync::Arc;

use image::DynamicImage;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::domain::{AestheticResult, ImageInfo, QaError, QaModule};
use crate::inference::{argmax, dot, softmax};
use crate::ports::EmbeddingService;

/// Default quality descriptions, paired 1:1 with [`DEFAULT_FEEDBACK`].
pub const DEFAULT_PROMPTS: [&str; 6] = [
    "a clean product photo on a white background",
    "a professional studio shot of a product",
    "a blurry low-quality photo",
    "a cluttered messy product photo",
    "a well-lit and sharp product image",
    "an overexposed amateur product photo",
];

/// Feedback for each entry of [`DEFAULT_PROMPTS`].
pub const DEFAULT_FEEDBACK: [&str; 6] = [
    "Clean and ecommerce-ready image!",
    "Looks professional — great studio-like quality.",
    "Blurry image. Try stabilizing the camera.",
    "Background is distracting. Keep it clean and minimal.",
    "Very good lighting and sharpness!",
    "Overexposed — reduce lighting or avoid direct flash.",
];

/// Feedback for a prompt with no mapped message.
pub const FALLBACK_FEEDBACK: &str = "Image looks okay, but could be improved.";

/// Scale applied to cosine similarities before the softmax.
pub const DEFAULT_TEMPERATURE: f64 = 100.0;

/// Fixed set of quality descriptions and their feedback messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBank {
    prompts: Vec<String>,
    feedback: Vec<String>,
}

impl PromptBank {
    /// Creates a prompt bank.
    ///
    /// `feedback[i]` belongs to `prompts[i]`; prompts past the end of
    /// `feedback` fall back to a generic message.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::InvalidInput`] if `prompts` is empty.
    pub fn new(prompts: Vec<String>, feedback: Vec<String>) -> Result<Self, QaError> {
        if prompts.is_empty() {
            return Err(QaError::InvalidInput(
                "prompt bank must contain at least one prompt".into(),
            ));
        }
        Ok(Self { prompts, feedback })
    }

    /// Prompts in bank order.
    #[must_use]
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Number of prompts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Always false; a bank holds at least one prompt.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Feedback for the prompt at `index`.
    #[must_use]
    pub fn feedback_for(&self, index: usize) -> &str {
        self.feedback
            .get(index)
            .map_or(FALLBACK_FEEDBACK, String::as_str)
    }
}

impl Default for PromptBank {
    fn default() -> Self {
        Self {
            prompts: DEFAULT_PROMPTS.iter().map(ToString::to_string).collect(),
            feedback: DEFAULT_FEEDBACK.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Aesthetic QA module.
///
/// Holds a shared handle to the embedding model; building several modules
/// from one `Arc` never loads the model twice.
pub struct AestheticModule {
    bank: PromptBank,
    embedder: Arc<dyn EmbeddingService>,
    temperature: f64,
    prompt_embeddings: OnceCell<Vec<Vec<f32>>>,
}

impl AestheticModule {
    /// Creates a module with the default prompt bank.
    #[must_use]
    pub fn new(embedder: Arc<dyn EmbeddingService>) -> Self {
        Self::with_bank(embedder, PromptBank::default())
    }

    /// Creates a module with a custom prompt bank.
    #[must_use]
    pub fn with_bank(embedder: Arc<dyn EmbeddingService>, bank: PromptBank) -> Self {
        Self {
            bank,
            embedder,
            temperature: DEFAULT_TEMPERATURE,
            prompt_embeddings: OnceCell::new(),
        }
    }

    /// Returns the prompt bank.
    #[must_use]
    pub const fn bank(&self) -> &PromptBank {
        &self.bank
    }

    /// Scores an already decoded image against the prompt bank.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::ModelUnavailable`] if embedding fails or the model
    /// returns vectors of mismatched size.
    pub fn score_image(&self, image: &DynamicImage) -> Result<AestheticResult, QaError> {
        let prompt_embeddings = self.prompt_embeddings.get_or_try_init(|| {
            let prompts: Vec<&str> = self.bank.prompts().iter().map(String::as_str).collect();
            let embeddings = self.embedder.embed_texts(&prompts)?;
            if embeddings.len() != prompts.len() {
                return Err(QaError::ModelUnavailable(format!(
                    "expected {} prompt embeddings, got {}",
                    prompts.len(),
                    embeddings.len()
                )));
            }
            debug!(count = embeddings.len(), "prompt embeddings computed");
            Ok(embeddings)
        })?;

        let image_embedding = self.embedder.embed_image(image)?;
        if let Some(bad) = prompt_embeddings
            .iter()
            .find(|e| e.len() != image_embedding.len())
        {
            return Err(QaError::ModelUnavailable(format!(
                "embedding size mismatch: image {} vs text {}",
                image_embedding.len(),
                bad.len()
            )));
        }

        let logits: Vec<f64> = prompt_embeddings
            .iter()
            .map(|text| self.temperature * dot(&image_embedding, text))
            .collect();
        let probabilities = softmax(&logits);
        let best = argmax(&probabilities)
            .ok_or_else(|| QaError::ModelUnavailable("empty similarity vector".into()))?;

        let score = probabilities[best].clamp(0.0, 1.0);
        let best_prompt = self.bank.prompts()[best].clone();
        debug!(best, score, best_prompt = %best_prompt, "aesthetic scored");

        Ok(AestheticResult {
            best_prompt,
            score,
            probabilities,
            feedback: self.bank.feedback_for(best).to_string(),
        })
    }
}

impl QaModule for AestheticModule {
    type Output = AestheticResult;

    fn name(&self) -> &'static str {
        "aesthetic"
    }

    /// Decodes `image.path` independently of the in-memory buffer, since the
    /// embedding model brings its own preprocessing.
    fn analyze(&self, image: &ImageInfo) -> Result<AestheticResult, QaError> {
        let decoded = image::open(&image.path).map_err(|e| {
            QaError::InvalidInput(format!("failed to open {}: {e}", image.path))
        })?;
        self.score_image(&decoded)
    }
}
