//! CLIP ViT-B/32 embedding model.
//!
//! Text and images are projected into a shared 512-dimensional space. The
//! weights and the BPE tokenizer are read from disk on first use.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::clip::{ClipConfig, ClipModel};
use image::imageops::FilterType;
use image::DynamicImage;
use once_cell::sync::OnceCell;
use tokenizers::Tokenizer;
use tracing::debug;

use super::{get_device, l2_normalize, LazyModel};
use crate::domain::QaError;
use crate::ports::EmbeddingService;

/// Side length of the square model input.
pub const IMAGE_SIZE: u32 = 224;

/// Maximum token sequence length.
const MAX_TOKENS: usize = 77;

/// End-of-text token, also used as padding.
const PAD_TOKEN: &str = "<|endoftext|>";

const PIXEL_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
const PIXEL_STD: [f32; 3] = [0.268_629_54, 0.261_302_6, 0.275_777_1];

fn build_clip(vb: VarBuilder) -> Result<ClipModel> {
    ClipModel::new(vb, &ClipConfig::vit_base_patch32()).context("failed to build CLIP model")
}

/// Lazily loaded CLIP embedder.
///
/// Share one instance behind an `Arc`; the weights are loaded at most once.
pub struct ClipEmbedder {
    model: LazyModel<ClipModel>,
    tokenizer_path: PathBuf,
    tokenizer: OnceCell<Tokenizer>,
}

impl ClipEmbedder {
    /// Creates an embedder from a weights file and a `tokenizer.json`.
    ///
    /// Neither file is read until the first embedding request.
    #[must_use]
    pub fn new(weights: impl AsRef<Path>, tokenizer: impl AsRef<Path>) -> Self {
        Self::with_device(weights, tokenizer, get_device())
    }

    /// Like [`ClipEmbedder::new`] but on an explicit device.
    #[must_use]
    pub fn with_device(
        weights: impl AsRef<Path>,
        tokenizer: impl AsRef<Path>,
        device: Device,
    ) -> Self {
        Self {
            model: LazyModel::new(weights, device, build_clip),
            tokenizer_path: tokenizer.as_ref().to_path_buf(),
            tokenizer: OnceCell::new(),
        }
    }

    /// Whether the weights have been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.model.is_loaded()
    }

    fn tokenizer(&self) -> Result<&Tokenizer> {
        self.tokenizer.get_or_try_init(|| {
            debug!(path = %self.tokenizer_path.display(), "loading tokenizer");
            Tokenizer::from_file(&self.tokenizer_path).map_err(|e| {
                anyhow!(
                    "failed to load tokenizer {}: {e}",
                    self.tokenizer_path.display()
                )
            })
        })
    }

    fn tokenize(&self, texts: &[&str]) -> Result<Tensor> {
        let tokenizer = self.tokenizer()?;
        let pad_id = tokenizer
            .token_to_id(PAD_TOKEN)
            .ok_or_else(|| anyhow!("tokenizer has no {PAD_TOKEN} token"))?;

        let mut rows = Vec::with_capacity(texts.len());
        for text in texts {
            let encoding = tokenizer
                .encode(*text, true)
                .map_err(|e| anyhow!("failed to tokenize {text:?}: {e}"))?;
            let mut ids = encoding.get_ids().to_vec();
            ids.truncate(MAX_TOKENS);
            rows.push(ids);
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut flat = Vec::with_capacity(rows.len() * width);
        for mut ids in rows {
            ids.resize(width, pad_id);
            flat.extend(ids);
        }
        Ok(Tensor::from_vec(
            flat,
            (texts.len(), width),
            self.model.device(),
        )?)
    }

    fn embed_image_inner(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        let pixels = preprocess(image, self.model.device())?;
        let model = self.model.get()?;
        let features = model.get_image_features(&pixels)?;
        let rows = features.to_dtype(DType::F32)?.to_vec2::<f32>()?;
        rows.into_iter()
            .next()
            .map(l2_normalize)
            .ok_or_else(|| anyhow!("model returned no image features"))
    }

    fn embed_texts_inner(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let input_ids = self.tokenize(texts)?;
        let model = self.model.get()?;
        let features = model.get_text_features(&input_ids)?;
        let rows = features.to_dtype(DType::F32)?.to_vec2::<f32>()?;
        Ok(rows.into_iter().map(l2_normalize).collect())
    }
}

impl EmbeddingService for ClipEmbedder {
    fn embed_image(&self, image: &DynamicImage) -> Result<Vec<f32>, QaError> {
        self.embed_image_inner(image).map_err(QaError::model)
    }

    fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, QaError> {
        self.embed_texts_inner(texts).map_err(QaError::model)
    }
}

/// Converts an image to a normalized `(1, 3, 224, 224)` tensor.
///
/// The image is scaled to cover the square and center-cropped.
///
/// # Errors
///
/// Returns an error if tensor construction fails.
pub fn preprocess(image: &DynamicImage, device: &Device) -> Result<Tensor> {
    let rgb = image
        .resize_to_fill(IMAGE_SIZE, IMAGE_SIZE, FilterType::CatmullRom)
        .to_rgb8();
    let side = IMAGE_SIZE as usize;

    let data: Vec<f32> = rgb.into_raw().into_iter().map(f32::from).collect();
    let hwc = Tensor::from_vec(data, (side, side, 3), device)?;
    let chw = (hwc.permute((2, 0, 1))? / 255.0)?;

    let mean = Tensor::from_slice(&PIXEL_MEAN[..], (3, 1, 1), device)?;
    let std = Tensor::from_slice(&PIXEL_STD[..], (3, 1, 1), device)?;
    let normalized = chw.broadcast_sub(&mean)?.broadcast_div(&std)?;
    Ok(normalized.unsqueeze(0)?)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_preprocess_shape() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(640, 480));
        let tensor = preprocess(&image, &Device::Cpu).expect("preprocess");
        assert_eq!(tensor.dims(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_preprocess_normalizes_channels() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([255, 255, 255])));
        let tensor = preprocess(&image, &Device::Cpu).expect("preprocess");
        let values = tensor
            .squeeze(0)
            .and_then(|t| t.mean_keepdim(2))
            .and_then(|t| t.mean_keepdim(1))
            .and_then(|t| t.flatten_all())
            .and_then(|t| t.to_vec1::<f32>())
            .expect("channel means");

        for (c, value) in values.iter().enumerate() {
            let expected = (1.0 - PIXEL_MEAN[c]) / PIXEL_STD[c];
            assert!((value - expected).abs() < 1e-3, "channel {c}: {value}");
        }
    }

    #[test]
    fn test_missing_weights_is_model_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let embedder = ClipEmbedder::with_device(
            dir.path().join("clip.safetensors"),
            dir.path().join("tokenizer.json"),
            Device::Cpu,
        );

        let err = embedder
            .embed_image(&DynamicImage::new_rgb8(8, 8))
            .expect_err("no weights");
        assert!(matches!(err, QaError::ModelUnavailable(_)));
        assert!(!embedder.is_loaded());

        let err = embedder.embed_texts(&["a photo"]).expect_err("no tokenizer");
        assert!(matches!(err, QaError::ModelUnavailable(_)));
    }

    #[test]
    fn test_empty_text_batch_needs_no_model() {
        let embedder = ClipEmbedder::with_device("missing", "missing", Device::Cpu);
        let embeddings = embedder.embed_texts(&[]).expect("empty batch");
        assert!(embeddings.is_empty());
    }
}
