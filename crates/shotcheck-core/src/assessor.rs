//! Runs every analyzer on one image and fuses the results.

use std::sync::Arc;

use tracing::{debug, info_span};

use crate::domain::{Assessment, ImageInfo, QaError, QaModule};
use crate::modules::{
    AestheticModule, FramingConfig, FramingModule, FusionStrategy, LightingConfig,
    LightingModule, PromptBank, SharpnessConfig, SharpnessModule,
};
use crate::ports::EmbeddingService;

/// Analyzer settings for one [`Assessor`].
#[derive(Debug, Clone, Default)]
pub struct AssessorConfig {
    /// Sharpness settings.
    pub sharpness: SharpnessConfig,
    /// Lighting settings.
    pub lighting: LightingConfig,
    /// Framing settings.
    pub framing: FramingConfig,
    /// Aesthetic prompts and feedback.
    pub prompts: PromptBank,
    /// How results are fused.
    pub fusion: FusionStrategy,
}

/// The full assessment pipeline.
pub struct Assessor {
    sharpness: SharpnessModule,
    lighting: LightingModule,
    framing: FramingModule,
    aesthetic: AestheticModule,
    fusion: FusionStrategy,
}

impl Assessor {
    /// Builds the pipeline around a shared embedding model.
    #[must_use]
    pub fn new(config: AssessorConfig, embedder: Arc<dyn EmbeddingService>) -> Self {
        Self {
            sharpness: SharpnessModule::new(config.sharpness),
            lighting: LightingModule::new(config.lighting),
            framing: FramingModule::new(config.framing),
            aesthetic: AestheticModule::with_bank(embedder, config.prompts),
            fusion: config.fusion,
        }
    }

    /// Replaces the framing analyzer, e.g. to plug in another subject detector.
    #[must_use]
    pub fn with_framing(mut self, framing: FramingModule) -> Self {
        self.framing = framing;
        self
    }

    /// Fusion strategy in use.
    #[must_use]
    pub const fn fusion(&self) -> FusionStrategy {
        self.fusion
    }

    /// Assesses one image.
    ///
    /// # Errors
    ///
    /// Returns the first analyzer error; fusion does not run in that case.
    pub fn assess(&self, image: &ImageInfo) -> Result<Assessment, QaError> {
        let _span = info_span!("assess", path = %image.path).entered();

        let sharpness = self.sharpness.analyze(image)?;
        let lighting = self.lighting.analyze(image)?;
        let framing = self.framing.analyze(image)?;
        let aesthetic = self.aesthetic.analyze(image)?;

        let verdict = self
            .fusion
            .fuse(&sharpness, &lighting, &framing, &aesthetic);
        debug!(
            strategy = %self.fusion,
            final_score = verdict.final_score,
            grade = %verdict.grade,
            "assessment fused"
        );

        Ok(Assessment {
            sharpness,
            lighting,
            framing,
            aesthetic,
            verdict,
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};

    struct FlatEmbedder;

    impl EmbeddingService for FlatEmbedder {
        fn embed_image(&self, _image: &DynamicImage) -> Result<Vec<f32>, QaError> {
            Ok(vec![1.0, 0.0])
        }

        fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, QaError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[test]
    fn test_empty_image_aborts_before_fusion() {
        let assessor = Assessor::new(AssessorConfig::default(), Arc::new(FlatEmbedder));
        let info = ImageInfo::new("empty.png", DynamicImage::new_luma8(0, 0));
        let err = assessor.assess(&info).expect_err("empty image");
        assert!(matches!(err, QaError::InvalidInput(_)));
    }

    #[test]
    fn test_unreadable_path_fails_in_aesthetic() {
        let assessor = Assessor::new(AssessorConfig::default(), Arc::new(FlatEmbedder));
        let img = GrayImage::from_fn(50, 50, |x, _| Luma([if x < 25 { 30 } else { 220 }]));
        let info = ImageInfo::new("/nonexistent/shot.png", DynamicImage::ImageLuma8(img));
        let err = assessor.assess(&info).expect_err("path cannot be decoded");
        assert!(matches!(err, QaError::InvalidInput(_)));
    }

    #[test]
    fn test_fusion_strategy_is_configurable() {
        let config = AssessorConfig {
            fusion: FusionStrategy::PointAllocation,
            ..AssessorConfig::default()
        };
        let assessor = Assessor::new(config, Arc::new(FlatEmbedder));
        assert_eq!(assessor.fusion(), FusionStrategy::PointAllocation);
    }

    #[test]
    fn test_uniform_similarities_spread_probability() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gray.png");
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 40, Luma([128])));
        img.save(&path).expect("save");

        let assessor = Assessor::new(AssessorConfig::default(), Arc::new(FlatEmbedder));
        let assessment = assessor
            .assess(&ImageInfo::new(path.to_string_lossy(), img))
            .expect("assessment");

        // Every prompt ties, so the first one wins with probability 1/6.
        assert_eq!(
            assessment.aesthetic.best_prompt,
            crate::modules::DEFAULT_PROMPTS[0]
        );
        assert!((assessment.aesthetic.score - 1.0 / 6.0).abs() < 1e-9);
        assert!(assessment.sharpness.is_blurry);
        assert!(!assessment.framing.object_detected());
        assert_eq!(
            assessment.verdict.grade,
            crate::domain::Grade::NeedsImprovement
        );
    }
}
