//! Validation and fix results, and the deduplicating collector.

use crate::content::Artifact;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Severity level of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Reported but never fails the run.
    Warning,
    /// Fails the run.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// What happened when the fix pass visited a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    /// The fix ran; carries the fix message.
    Applied(String),
    /// The validator is fixable but found no safe transformation.
    Unavailable(String),
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub code: String,
    pub message: String,
    /// Reported path; defaults to the item's path.
    pub path: PathBuf,
    /// Path of the item the result belongs to.
    pub item_path: PathBuf,
    pub fix_available: bool,
    pub severity: Severity,
    pub fix_outcome: Option<FixOutcome>,
}

impl ValidationResult {
    pub fn new(code: &str, message: impl Into<String>, item: &Artifact) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            path: item.path.clone(),
            item_path: item.path.clone(),
            fix_available: false,
            severity: Severity::Error,
            fix_outcome: None,
        }
    }

    /// A result about a file that is not (or could not become) an artifact.
    pub fn for_path(code: &str, message: impl Into<String>, path: &Path) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            path: path.to_path_buf(),
            item_path: path.to_path_buf(),
            fix_available: false,
            severity: Severity::Error,
            fix_outcome: None,
        }
    }

    /// Report against a related file rather than the item itself.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_fix_available(mut self, fix_available: bool) -> Self {
        self.fix_available = fix_available;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.fix_outcome, Some(FixOutcome::Applied(_)))
    }

    /// Whether this result fails the run.
    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Error && !self.is_fixed()
    }

    fn key(&self) -> (String, PathBuf, String) {
        (self.code.clone(), self.path.clone(), self.message.clone())
    }
}

/// Outcome of a successful fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixResult {
    pub code: String,
    pub message: String,
    pub path: PathBuf,
}

impl FixResult {
    pub fn new(code: &str, message: impl Into<String>, item: &Artifact) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            path: item.path.clone(),
        }
    }
}

/// Collects results, dropping duplicates on `(code, path, message)`.
#[derive(Debug, Default)]
pub struct ResultCollector {
    results: Vec<ValidationResult>,
    seen: HashSet<(String, PathBuf, String)>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result; returns false when it was a duplicate.
    pub fn push(&mut self, result: ValidationResult) -> bool {
        if !self.seen.insert(result.key()) {
            return false;
        }
        self.results.push(result);
        true
    }

    pub fn extend(&mut self, results: impl IntoIterator<Item = ValidationResult>) {
        for result in results {
            self.push(result);
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ValidationResult> {
        self.results.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ValidationResult> {
        self.results.get_mut(index)
    }

    /// Results ordered by `(path, code, message)`.
    pub fn into_sorted(mut self) -> Vec<ValidationResult> {
        self.results.sort_by(|a, b| {
            (&a.path, &a.code, &a.message).cmp(&(&b.path, &b.code, &b.message))
        });
        self.results
    }
}

/// Final outcome of a validate run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<ValidationResult>,
    pub cancelled: bool,
    /// Files written by the fix pass.
    pub written: Vec<PathBuf>,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    pub fn warnings(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.severity == Severity::Warning)
            .count()
    }

    pub fn fixed(&self) -> usize {
        self.results.iter().filter(|r| r.is_fixed()).count()
    }

    /// Highest severity among unfixed results.
    pub fn max_severity(&self) -> Option<Severity> {
        self.results
            .iter()
            .filter(|r| !r.is_fixed())
            .map(|r| r.severity)
            .max()
    }

    /// 0 when nothing fails, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self.max_severity() {
            Some(Severity::Error) => 1,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(code: &str, path: &str, message: &str) -> ValidationResult {
        ValidationResult::for_path(code, message, Path::new(path))
    }

    #[test]
    fn collector_drops_duplicates() {
        let mut collector = ResultCollector::new();
        assert!(collector.push(result("BA101", "a.yml", "m")));
        assert!(!collector.push(result("BA101", "a.yml", "m")));
        assert!(collector.push(result("BA101", "a.yml", "other")));
        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn sorted_by_path_code_message() {
        let mut collector = ResultCollector::new();
        collector.extend([
            result("BA101", "b.yml", "x"),
            result("PB100", "a.yml", "y"),
            result("BA101", "a.yml", "z"),
            result("BA101", "a.yml", "a"),
        ]);
        let order: Vec<_> = collector
            .into_sorted()
            .into_iter()
            .map(|r| format!("{}:{}:{}", r.path.display(), r.code, r.message))
            .collect();
        assert_eq!(
            order,
            vec!["a.yml:BA101:a", "a.yml:BA101:z", "a.yml:PB100:y", "b.yml:BA101:x"]
        );
    }

    #[test]
    fn warnings_do_not_fail_the_run() {
        let report = RunReport {
            results: vec![result("RM100", "a", "m").with_severity(Severity::Warning)],
            ..Default::default()
        };
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.warnings(), 1);
    }

    #[test]
    fn fixed_results_do_not_fail_the_run() {
        let mut fixed = result("BA101", "a", "m");
        fixed.fix_outcome = Some(FixOutcome::Applied("done".into()));
        let mut unavailable = result("BA106", "a", "m");
        unavailable.fix_outcome = Some(FixOutcome::Unavailable("nope".into()));

        let report = RunReport {
            results: vec![fixed.clone()],
            ..Default::default()
        };
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.fixed(), 1);

        let report = RunReport {
            results: vec![fixed, unavailable],
            ..Default::default()
        };
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn severity_ordering_and_display() {
        assert!(Severity::Warning < Severity::Error);
        assert_eq!(Severity::Error.to_string(), "error");
    }
}
