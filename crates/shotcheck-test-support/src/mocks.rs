//! Mock implementations of core port traits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use image::DynamicImage;
use shotcheck_core::{EmbeddingService, QaError, Report, ResultOutput};

/// Embedding width used by [`MockEmbeddingService`].
pub const MOCK_DIMS: usize = 32;

enum Behavior {
    Prefer(usize),
    Fail(String),
}

/// Mock implementation of `EmbeddingService`.
///
/// Text `i` of a batch embeds to the basis vector `e_i`. The image embedding
/// leans toward one chosen prompt, so that prompt wins the similarity match.
pub struct MockEmbeddingService {
    behavior: Behavior,
    image_calls: AtomicUsize,
    text_calls: AtomicUsize,
}

impl MockEmbeddingService {
    /// Image embeddings favor the prompt at `index`.
    #[must_use]
    pub fn preferring(index: usize) -> Self {
        Self::with_behavior(Behavior::Prefer(index % MOCK_DIMS))
    }

    /// Every call fails with `QaError::ModelUnavailable(message)`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Fail(message.into()))
    }

    const fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            image_calls: AtomicUsize::new(0),
            text_calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed_image` calls.
    #[must_use]
    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    /// Number of `embed_texts` calls.
    #[must_use]
    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }
}

#[allow(clippy::cast_precision_loss)]
impl EmbeddingService for MockEmbeddingService {
    fn embed_image(&self, _image: &DynamicImage) -> Result<Vec<f32>, QaError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Fail(message) => Err(QaError::ModelUnavailable(message.clone())),
            Behavior::Prefer(target) => {
                let mut v = vec![0.1f32; MOCK_DIMS];
                v[*target] = 1.0;
                let norm = (1.0 + 0.01 * (MOCK_DIMS - 1) as f32).sqrt();
                Ok(v.into_iter().map(|x| x / norm).collect())
            }
        }
    }

    fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, QaError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        if let Behavior::Fail(message) = &self.behavior {
            return Err(QaError::ModelUnavailable(message.clone()));
        }
        if texts.len() > MOCK_DIMS {
            return Err(QaError::ModelUnavailable(format!(
                "mock embeds at most {MOCK_DIMS} texts"
            )));
        }
        Ok((0..texts.len())
            .map(|i| {
                let mut v = vec![0.0f32; MOCK_DIMS];
                v[i] = 1.0;
                v
            })
            .collect())
    }
}

/// Mock implementation of `ResultOutput`.
///
/// Captures reports for later assertions.
pub struct MockResultOutput {
    reports: Arc<Mutex<Vec<Report>>>,
    flush_count: AtomicUsize,
}

impl MockResultOutput {
    /// Creates an empty mock output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reports: Arc::new(Mutex::new(Vec::new())),
            flush_count: AtomicUsize::new(0),
        }
    }

    /// Returns all captured reports.
    #[must_use]
    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `flush()` calls.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flush_count.load(Ordering::SeqCst)
    }
}

impl Default for MockResultOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultOutput for MockResultOutput {
    fn write(&self, report: &Report) -> anyhow::Result<()> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        self.flush_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_preferred_prompt_has_highest_similarity() {
        let mock = MockEmbeddingService::preferring(2);
        let image = mock.embed_image(&DynamicImage::new_rgb8(4, 4)).unwrap();
        let texts = mock.embed_texts(&["a", "b", "c", "d"]).unwrap();

        let sims: Vec<f32> = texts.iter().map(|t| dot(&image, t)).collect();
        assert!(sims[2] > sims[0] && sims[2] > sims[1] && sims[2] > sims[3]);

        let norm = dot(&image, &image).sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert_eq!(mock.image_calls(), 1);
        assert_eq!(mock.text_calls(), 1);
    }

    #[test]
    fn test_failing_mock() {
        let mock = MockEmbeddingService::failing("offline");
        let err = mock.embed_texts(&["a"]).unwrap_err();
        assert_eq!(err.to_string(), "model unavailable: offline");
        assert!(mock.embed_image(&DynamicImage::new_rgb8(1, 1)).is_err());
    }
}
