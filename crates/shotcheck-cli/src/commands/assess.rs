//! Assess command - score a product photo for listing readiness.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use shotcheck_adapters::models::{missing_models_in, CLIP_TOKENIZER, CLIP_WEIGHTS};
use shotcheck_adapters::{load_image, model_path_in, models_dir};
use shotcheck_core::modules::{FramingConfig, LightingConfig, PromptBank, SharpnessConfig};
use shotcheck_core::{
    Assessor, AssessorConfig, ClipEmbedder, FusionStrategy, Grade, ImageDimensions, Report,
    ResultOutput,
};
use tracing::{debug, info};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, TextOutput};

/// Output format for the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable verdict and per-check feedback
    #[default]
    Text,
    /// Single JSON object
    Json,
}

/// Fusion strategy selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FusionArg {
    /// Weighted sum of binary checks plus aesthetic score
    WeightedAverage,
    /// 25/25/20/30 point budget out of 100
    PointAllocation,
}

impl From<FusionArg> for FusionStrategy {
    fn from(arg: FusionArg) -> Self {
        match arg {
            FusionArg::WeightedAverage => Self::WeightedAverage,
            FusionArg::PointAllocation => Self::PointAllocation,
        }
    }
}

/// Parse a fraction (0.0-1.0).
fn parse_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0.0..=1.0"))
    }
}

/// Parse a non-negative, finite number.
fn parse_non_negative(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} must be a finite number >= 0"))
    }
}

/// Arguments for assessing an image.
#[derive(Args, Clone)]
pub struct AssessArgs {
    /// Product photo to assess
    pub image: Option<PathBuf>,

    /// Laplacian variance below which the image counts as blurry
    #[arg(long, value_parser = parse_non_negative)]
    pub sharpness_threshold: Option<f64>,

    /// Luminance below which a pixel counts as dark (0-255)
    #[arg(long)]
    pub low_thresh: Option<u8>,

    /// Luminance above which a pixel counts as bright (0-255)
    #[arg(long)]
    pub high_thresh: Option<u8>,

    /// Dark pixel fraction that flags the image as too dark (0.0-1.0)
    #[arg(long, value_parser = parse_fraction)]
    pub dark_limit: Option<f64>,

    /// Bright pixel fraction that flags the image as too bright (0.0-1.0)
    #[arg(long, value_parser = parse_fraction)]
    pub bright_limit: Option<f64>,

    /// Allowed subject offset from center, per dimension (0.0-1.0)
    #[arg(long, value_parser = parse_fraction)]
    pub margin_ratio: Option<f64>,

    /// How the four checks combine into a verdict
    #[arg(long, value_enum)]
    pub fusion: Option<FusionArg>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl AssessArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Built-in defaults (in `assessor_config`)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        args.sharpness_threshold = args.sharpness_threshold.or(config.sharpness.threshold);
        args.low_thresh = args.low_thresh.or(config.lighting.low_thresh);
        args.high_thresh = args.high_thresh.or(config.lighting.high_thresh);
        args.dark_limit = args.dark_limit.or(config.lighting.dark_pct_limit);
        args.bright_limit = args.bright_limit.or(config.lighting.bright_pct_limit);
        args.margin_ratio = args.margin_ratio.or(config.framing.margin_ratio);

        if args.fusion.is_none() {
            args.fusion = config
                .fusion
                .strategy
                .as_deref()
                .and_then(|s| match s {
                    "weighted_average" => Some(FusionArg::WeightedAverage),
                    "point_allocation" => Some(FusionArg::PointAllocation),
                    _ => None,
                });
        }

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_deref()
                .and_then(|s| match s {
                    "json" => Some(OutputFormat::Json),
                    "text" => Some(OutputFormat::Text),
                    _ => None,
                });
        }

        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }

        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }

        args.config = Some(config.clone());
        args
    }

    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    /// Analyzer settings with built-in defaults filled in.
    fn assessor_config(&self) -> Result<AssessorConfig> {
        let sharpness = SharpnessConfig {
            threshold: self
                .sharpness_threshold
                .unwrap_or(SharpnessConfig::default().threshold),
        };

        let base = LightingConfig::default();
        let lighting = LightingConfig {
            low_thresh: self.low_thresh.unwrap_or(base.low_thresh),
            high_thresh: self.high_thresh.unwrap_or(base.high_thresh),
            dark_pct_limit: self.dark_limit.unwrap_or(base.dark_pct_limit),
            bright_pct_limit: self.bright_limit.unwrap_or(base.bright_pct_limit),
        };
        anyhow::ensure!(
            lighting.low_thresh <= lighting.high_thresh,
            "--low-thresh ({}) must not exceed --high-thresh ({})",
            lighting.low_thresh,
            lighting.high_thresh
        );

        let framing = FramingConfig {
            margin_ratio: self
                .margin_ratio
                .unwrap_or(FramingConfig::default().margin_ratio),
        };

        let aesthetic = self.config.as_ref().map(|c| &c.aesthetic);
        let prompts = match aesthetic.and_then(|a| a.prompts.clone()) {
            Some(prompts) => {
                let feedback = aesthetic
                    .and_then(|a| a.feedback.clone())
                    .unwrap_or_default();
                debug!(count = prompts.len(), "using configured prompts");
                PromptBank::new(prompts, feedback).context("invalid aesthetic prompts")?
            }
            None => PromptBank::default(),
        };

        Ok(AssessorConfig {
            sharpness,
            lighting,
            framing,
            prompts,
            fusion: self.fusion.map(FusionStrategy::from).unwrap_or_default(),
        })
    }
}

/// Result of running the assess command.
#[allow(dead_code)] // Fields exposed for programmatic use
pub struct AssessResult {
    /// Verdict tier of the assessed image.
    pub grade: Grade,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the assess command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &AssessArgs) -> Result<AssessResult> {
    let Some(path) = args.image.as_ref() else {
        anyhow::bail!("no image specified");
    };
    info!("Assessing {}", path.display());

    let config = args.assessor_config()?;
    let image = load_image(path)?;

    let dir = args.models_dir.clone().unwrap_or_else(models_dir);
    debug!("Using models directory: {}", dir.display());
    let missing = missing_models_in(&dir);
    if !missing.is_empty() {
        anyhow::bail!(
            "model unavailable: {} not found in {}. Run `shotcheck models fetch`.",
            missing.join(", "),
            dir.display()
        );
    }
    let weights = model_path_in(&dir, CLIP_WEIGHTS).context("unknown model: CLIP weights")?;
    let tokenizer = model_path_in(&dir, CLIP_TOKENIZER).context("unknown model: CLIP tokenizer")?;

    let assessor = Assessor::new(
        config,
        Arc::new(ClipEmbedder::new(weights, tokenizer)),
    );
    let assessment = assessor.assess(&image)?;

    let grade = assessment.verdict.grade;
    let report = Report {
        path: image.path.clone(),
        timestamp: iso_timestamp(),
        dimensions: ImageDimensions::new(image.width, image.height),
        assessment,
    };

    let output: Box<dyn ResultOutput> = match args.format() {
        OutputFormat::Json => Box::new(JsonOutput::stdout(args.pretty)),
        OutputFormat::Text => Box::new(TextOutput::stdout()),
    };
    output.write(&report)?;
    output.flush()?;

    Ok(AssessResult {
        grade,
        exit_code: exit_code_for(grade),
    })
}

fn exit_code_for(grade: Grade) -> ExitCode {
    match grade {
        Grade::NeedsImprovement => ExitCode::NeedsImprovement,
        _ => ExitCode::Success,
    }
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: AssessArgs,
    }

    fn parse(argv: &[&str]) -> AssessArgs {
        let mut full = vec!["shotcheck"];
        full.extend_from_slice(argv);
        Harness::try_parse_from(full).expect("parse").args
    }

    fn config(toml: &str) -> AppConfig {
        toml::from_str(toml).expect("config")
    }

    #[test]
    fn test_parse_fraction() {
        assert_eq!(parse_fraction("0.25"), Ok(0.25));
        assert_eq!(parse_fraction("1"), Ok(1.0));
        assert!(parse_fraction("1.5").is_err());
        assert!(parse_fraction("-0.1").is_err());
        assert!(parse_fraction("half").is_err());
    }

    #[test]
    fn test_parse_non_negative() {
        assert_eq!(parse_non_negative("0"), Ok(0.0));
        assert_eq!(parse_non_negative("250.5"), Ok(250.5));
        assert!(parse_non_negative("-3").is_err());
        assert!(parse_non_negative("inf").is_err());
    }

    #[test]
    fn test_defaults_without_config() {
        let args = AssessArgs::with_config(parse(&["shot.jpg"]), &AppConfig::default());
        let cfg = args.assessor_config().unwrap();

        assert!((cfg.sharpness.threshold - 100.0).abs() < f64::EPSILON);
        assert_eq!(cfg.lighting.low_thresh, 40);
        assert_eq!(cfg.lighting.high_thresh, 200);
        assert!((cfg.framing.margin_ratio - 0.2).abs() < f64::EPSILON);
        assert_eq!(cfg.fusion, FusionStrategy::WeightedAverage);
        assert_eq!(cfg.prompts.len(), 6);
        assert_eq!(args.format(), OutputFormat::Text);
        assert!(!args.pretty);
    }

    #[test]
    fn test_config_fills_unset_flags() {
        let file = config(
            r"
[sharpness]
threshold = 42.0

[lighting]
low_thresh = 25
bright_pct_limit = 0.7

[fusion]
strategy = 'point_allocation'

[output]
format = 'json'
pretty = true

[models]
dir = '/srv/models'
",
        );
        let args = AssessArgs::with_config(parse(&["shot.jpg"]), &file);
        let cfg = args.assessor_config().unwrap();

        assert!((cfg.sharpness.threshold - 42.0).abs() < f64::EPSILON);
        assert_eq!(cfg.lighting.low_thresh, 25);
        assert!((cfg.lighting.bright_pct_limit - 0.7).abs() < f64::EPSILON);
        assert_eq!(cfg.fusion, FusionStrategy::PointAllocation);
        assert_eq!(args.format(), OutputFormat::Json);
        assert!(args.pretty);
        assert_eq!(args.models_dir, Some(PathBuf::from("/srv/models")));
    }

    #[test]
    fn test_cli_flags_beat_config() {
        let file = config(
            "[sharpness]\nthreshold = 42.0\n[fusion]\nstrategy = 'point_allocation'\n[output]\nformat = 'json'\n",
        );
        let args = AssessArgs::with_config(
            parse(&[
                "shot.jpg",
                "--sharpness-threshold",
                "7",
                "--fusion",
                "weighted-average",
                "--format",
                "text",
                "--models-dir",
                "/tmp/m",
            ]),
            &file,
        );
        let cfg = args.assessor_config().unwrap();

        assert!((cfg.sharpness.threshold - 7.0).abs() < f64::EPSILON);
        assert_eq!(cfg.fusion, FusionStrategy::WeightedAverage);
        assert_eq!(args.format(), OutputFormat::Text);
        assert_eq!(args.models_dir, Some(PathBuf::from("/tmp/m")));
    }

    #[test]
    fn test_configured_prompts() {
        let file = config("[aesthetic]\nprompts = ['crisp', 'muddy']\nfeedback = ['Ship it.']\n");
        let args = AssessArgs::with_config(parse(&["shot.jpg"]), &file);
        let cfg = args.assessor_config().unwrap();

        assert_eq!(cfg.prompts.len(), 2);
        assert_eq!(cfg.prompts.feedback_for(0), "Ship it.");
        assert_eq!(
            cfg.prompts.feedback_for(1),
            shotcheck_core::modules::FALLBACK_FEEDBACK
        );
    }

    #[test]
    fn test_out_of_range_flag_rejected() {
        let harness = Harness::try_parse_from(["shotcheck", "x.jpg", "--margin-ratio", "1.5"]);
        assert!(harness.is_err());
        let harness = Harness::try_parse_from(["shotcheck", "x.jpg", "--low-thresh", "256"]);
        assert!(harness.is_err());
    }

    #[test]
    fn test_inverted_luminance_cutoffs_rejected() {
        let args = AssessArgs::with_config(
            parse(&["shot.jpg", "--low-thresh", "210"]),
            &AppConfig::default(),
        );
        let err = args.assessor_config().unwrap_err().to_string();
        assert!(err.contains("must not exceed"), "{err}");

        let file = config("[lighting]\nhigh_thresh = 90\n");
        let args = AssessArgs::with_config(parse(&["shot.jpg", "--low-thresh", "100"]), &file);
        assert!(args.assessor_config().is_err());

        let args = AssessArgs::with_config(
            parse(&["shot.jpg", "--low-thresh", "120", "--high-thresh", "120"]),
            &AppConfig::default(),
        );
        assert!(args.assessor_config().is_ok());
    }

    #[test]
    fn test_exit_code_for_grade() {
        assert_eq!(exit_code_for(Grade::Excellent), ExitCode::Success);
        assert_eq!(exit_code_for(Grade::Good), ExitCode::Success);
        assert_eq!(exit_code_for(Grade::NeedsImprovement), ExitCode::NeedsImprovement);
    }

    #[test]
    fn test_iso_timestamp_format() {
        let ts = iso_timestamp();
        assert_eq!(ts.as_bytes()[4], b'-');
        assert_eq!(ts.as_bytes()[10], b'T');
        assert!(ts.ends_with('Z'), "{ts}");
    }
}
