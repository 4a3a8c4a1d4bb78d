//! CLI command definitions and handlers.

pub mod assess;
pub mod models;

use clap::{Parser, Subcommand};

/// Shotcheck - Product photo quality checker
#[derive(Parser)]
#[command(name = "shotcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared assess arguments (image, thresholds, output).
    #[command(flatten)]
    pub assess: assess::AssessArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Assess a product photo
    Assess(assess::AssessArgs),
    /// Manage the CLIP model files
    Models(models::ModelsArgs),
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Grade was Excellent or Good, or a non-assess command succeeded.
    Success = 0,
    /// Grade was Needs Improvement.
    NeedsImprovement = 1,
    /// Bad input, missing models, or any other failure.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
