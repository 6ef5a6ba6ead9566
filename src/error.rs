//! Error types for packlint operations.
//!
//! This module defines [`PacklintError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `PacklintError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `PacklintError::Other`) for unexpected errors
//! - Validation findings are never errors; they are reported as results

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for packlint operations.
#[derive(Debug, Error)]
pub enum PacklintError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// A content document could not be parsed.
    #[error("Failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// No classifier accepted the file.
    #[error("Could not classify {path} as any known content type")]
    UnclassifiedFile { path: PathBuf },

    /// More than one classifier of the highest precedence accepted the file.
    #[error("Ambiguous content type for {path}: {candidates}")]
    AmbiguousFile { path: PathBuf, candidates: String },

    /// A git invocation failed.
    #[error("Git error: {message}")]
    Git { message: String },

    /// Docker registry lookup failed.
    #[error("Docker lookup failed for '{image}': {message}")]
    Docker { image: String, message: String },

    /// Marketplace preparation was requested in an inconsistent way.
    #[error("Prepare failed: {message}")]
    Prepare { message: String },

    /// A fixable validator found no safe transformation.
    #[error("Fix unavailable for {code}: {message}")]
    FixUnavailable { code: String, message: String },

    /// The run was cancelled.
    #[error("Run cancelled")]
    Cancelled,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for packlint operations.
pub type Result<T> = std::result::Result<T, PacklintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_displays_path() {
        let err = PacklintError::ConfigNotFound {
            path: PathBuf::from("/foo/.packlint.yml"),
        };
        assert!(err.to_string().contains("/foo/.packlint.yml"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = PacklintError::ConfigParseError {
            path: PathBuf::from("/config.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/config.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn parse_error_displays_path_and_message() {
        let err = PacklintError::ParseError {
            path: PathBuf::from("Packs/A/Scripts/s.yml"),
            message: "mapping values are not allowed".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Packs/A/Scripts/s.yml"));
        assert!(msg.contains("mapping values"));
    }

    #[test]
    fn unclassified_file_displays_path() {
        let err = PacklintError::UnclassifiedFile {
            path: PathBuf::from("notes.txt"),
        };
        assert!(err.to_string().contains("notes.txt"));
    }

    #[test]
    fn ambiguous_file_displays_candidates() {
        let err = PacklintError::AmbiguousFile {
            path: PathBuf::from("x.yml"),
            candidates: "Script, Integration".into(),
        };
        assert!(err.to_string().contains("Script, Integration"));
    }

    #[test]
    fn git_error_displays_message() {
        let err = PacklintError::Git {
            message: "bad revision".into(),
        };
        assert!(err.to_string().contains("bad revision"));
    }

    #[test]
    fn docker_error_displays_image() {
        let err = PacklintError::Docker {
            image: "demisto/python3".into(),
            message: "401".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("demisto/python3"));
        assert!(msg.contains("401"));
    }

    #[test]
    fn fix_unavailable_displays_code() {
        let err = PacklintError::FixUnavailable {
            code: "BA101".into(),
            message: "no id".into(),
        };
        assert!(err.to_string().contains("BA101"));
    }

    #[test]
    fn cancelled_displays() {
        assert_eq!(PacklintError::Cancelled.to_string(), "Run cancelled");
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PacklintError = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn anyhow_error_converts() {
        let err: PacklintError = anyhow::anyhow!("something odd").into();
        assert_eq!(err.to_string(), "something odd");
    }
}
