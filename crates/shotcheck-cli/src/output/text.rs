//! Human-readable output adapter.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::Mutex;

use anyhow::Result;
use shotcheck_core::{Report, ResultOutput};

/// Plain-text report: per-check results, then the final verdict.
pub struct TextOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl TextOutput {
    /// Creates a new text output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Creates a new text output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

/// Renders a report the way it is printed to the terminal.
fn render(report: &Report) -> Result<String, std::fmt::Error> {
    let a = &report.assessment;
    let mut out = String::new();

    writeln!(
        out,
        "{} ({}x{})",
        report.path, report.dimensions.width, report.dimensions.height
    )?;
    writeln!(out)?;
    writeln!(out, "Results")?;
    writeln!(
        out,
        "  Blur Score: {:.2} ({})",
        a.sharpness.score,
        if a.sharpness.is_blurry { "blurry" } else { "sharp" }
    )?;
    writeln!(out, "  Lighting:   {}", a.lighting.feedback)?;
    writeln!(out, "  Framing:    {}", a.framing.feedback)?;
    writeln!(
        out,
        "  Aesthetic:  {} (confidence: {:.2})",
        a.aesthetic.feedback, a.aesthetic.score
    )?;
    writeln!(out)?;
    writeln!(out, "Final Verdict ({})", a.verdict.strategy)?;
    writeln!(
        out,
        "  Overall Image Score: {:.1} / 100 [{}]",
        a.verdict.final_score, a.verdict.grade
    )?;
    for line in a.verdict.summary.lines() {
        writeln!(out, "  {line}")?;
    }
    Ok(out)
}

impl ResultOutput for TextOutput {
    #[allow(clippy::significant_drop_tightening)]
    fn write(&self, report: &Report) -> Result<()> {
        let text = render(report)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}
