//! Human-readable output formatter.
//!
//! One line per unfixed result, shaped `<path>: <CODE> - <message>`, then the
//! fixes that were applied and a summary.

use super::ReportFormatter;
use crate::validate::results::{FixOutcome, RunReport, Severity, ValidationResult};
use console::style;
use std::io::Write;
use std::path::PathBuf;

/// Formats results for the terminal.
pub struct HumanFormatter {
    content_root: PathBuf,
    /// Whether to use colors (ANSI escape codes).
    pub use_color: bool,
}

impl HumanFormatter {
    pub fn new(content_root: impl Into<PathBuf>, use_color: bool) -> Self {
        Self {
            content_root: content_root.into(),
            use_color,
        }
    }

    fn location(&self, result: &ValidationResult) -> String {
        result
            .path
            .strip_prefix(&self.content_root)
            .unwrap_or(&result.path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn code(&self, result: &ValidationResult) -> String {
        if !self.use_color {
            return result.code.clone();
        }
        match result.severity {
            Severity::Error => style(&result.code).red().bold().to_string(),
            Severity::Warning => style(&result.code).yellow().bold().to_string(),
        }
    }
}

impl ReportFormatter for HumanFormatter {
    fn format<W: Write>(&self, report: &RunReport, writer: &mut W) -> std::io::Result<()> {
        for result in report.results.iter().filter(|r| !r.is_fixed()) {
            write!(
                writer,
                "{}: {} - {}",
                self.location(result),
                self.code(result),
                result.message
            )?;
            if let Some(FixOutcome::Unavailable(reason)) = &result.fix_outcome {
                write!(writer, " (fix unavailable: {})", reason)?;
            }
            writeln!(writer)?;
        }

        let fixed: Vec<&ValidationResult> = report.results.iter().filter(|r| r.is_fixed()).collect();
        if !fixed.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Fixed:")?;
            for result in &fixed {
                if let Some(FixOutcome::Applied(message)) = &result.fix_outcome {
                    writeln!(writer, "{}: {} - {}", self.location(result), result.code, message)?;
                }
            }
        }

        let errors = report.failures();
        let warnings = report.warnings();
        if errors > 0 || warnings > 0 {
            writeln!(writer)?;
            writeln!(writer, "Found {} error(s) and {} warning(s)", errors, warnings)?;
        }
        if report.cancelled {
            writeln!(writer, "Run cancelled; results are partial")?;
        }

        Ok(())
    }
}
