//! Validate output formatters.
//!
//! Both formatters consume the sorted, deduplicated [`RunReport`] so two runs
//! over the same input print byte-identical reports.

pub mod human;
pub mod json;

use super::results::RunReport;
use std::io::Write;

/// Output format for validate results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Trait for formatting a validate report.
pub trait ReportFormatter {
    fn format<W: Write>(&self, report: &RunReport, writer: &mut W) -> std::io::Result<()>;
}

pub use human::HumanFormatter;
pub use json::JsonFormatter;
