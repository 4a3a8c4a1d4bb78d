//! JSON output adapter.

use std::io::{self, Write};
use std::sync::Mutex;

use anyhow::Result;
use shotcheck_core::{Report, ResultOutput};

/// JSON output adapter, one object per report.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    pretty: bool,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout(pretty: bool) -> Self {
        Self::new(Box::new(io::stdout()), pretty)
    }

    /// Creates a new JSON output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>, pretty: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            pretty,
        }
    }
}

impl ResultOutput for JsonOutput {
    #[allow(clippy::significant_drop_tightening)]
    fn write(&self, report: &Report) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use shotcheck_core::{
        AestheticResult, Assessment, FramingResult, FusionStrategy, ImageDimensions,
        LightingResult, SharpnessResult,
    };

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn blank_report() -> Report {
        let sharpness = SharpnessResult {
            score: 0.0,
            is_blurry: true,
            feedback: "Image is blurry.".into(),
        };
        let lighting = LightingResult {
            mean_brightness: 0.0,
            is_dark: true,
            is_bright: false,
            dark_ratio: 1.0,
            bright_ratio: 0.0,
            feedback: "Image is too dark.".into(),
        };
        let framing = FramingResult {
            is_centered: false,
            object_center: None,
            image_center: None,
            subject_bbox: None,
            feedback: "No product detected.".into(),
        };
        let aesthetic = AestheticResult {
            best_prompt: "a blurry photo".into(),
            score: 0.2,
            probabilities: vec![0.2, 0.8],
            feedback: "Try again.".into(),
        };
        let verdict =
            FusionStrategy::WeightedAverage.fuse(&sharpness, &lighting, &framing, &aesthetic);
        Report {
            path: "dark.png".into(),
            timestamp: "2026-01-01T00:00:00Z".into(),
            dimensions: ImageDimensions::new(8, 8),
            assessment: Assessment {
                sharpness,
                lighting,
                framing,
                aesthetic,
                verdict,
            },
        }
    }

    fn written(pretty: bool) -> String {
        let captured = Captured::default();
        let output = JsonOutput::new(Box::new(captured.clone()), pretty);
        output.write(&blank_report()).unwrap();
        output.flush().unwrap();
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_compact_is_one_line() {
        let text = written(false);
        assert_eq!(text.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["path"], "dark.png");
        assert_eq!(value["verdict"]["grade"], "needs_improvement");
        assert!(value["framing"]["object_center"].is_null());
    }

    #[test]
    fn test_pretty_spans_lines() {
        let text = written(true);
        assert!(text.lines().count() > 10);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["dimensions"]["width"], 8);
    }
}
