//! JSON output formatter.
//!
//! Emits one object per unfixed result:
//! `{file_path, error_code, message, fix_available}`.

use super::ReportFormatter;
use crate::validate::results::RunReport;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

/// Formats results as a JSON array.
pub struct JsonFormatter {
    content_root: PathBuf,
}

#[derive(Serialize)]
struct JsonResult {
    file_path: String,
    error_code: String,
    message: String,
    fix_available: bool,
}

impl JsonFormatter {
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
        }
    }
}

impl ReportFormatter for JsonFormatter {
    fn format<W: Write>(&self, report: &RunReport, writer: &mut W) -> std::io::Result<()> {
        let results: Vec<JsonResult> = report
            .results
            .iter()
            .filter(|r| !r.is_fixed())
            .map(|r| JsonResult {
                file_path: r
                    .path
                    .strip_prefix(&self.content_root)
                    .unwrap_or(&r.path)
                    .to_string_lossy()
                    .replace('\\', "/"),
                error_code: r.code.clone(),
                message: r.message.clone(),
                fix_available: r.fix_available,
            })
            .collect();

        serde_json::to_writer_pretty(&mut *writer, &results).map_err(std::io::Error::other)?;
        writeln!(writer)
    }
}
