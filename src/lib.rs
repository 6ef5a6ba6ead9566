//! Packlint - graph-aware validation and formatting for content packs.
//!
//! A content repository holds packs of integrations, scripts, playbooks,
//! fields, layouts and other items as YAML and JSON documents. Packlint
//! loads them, links them into a content graph, and checks them against a
//! catalog of coded rules, fixing what can be fixed safely.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`codec`] - YAML/JSON document load and dump
//! - [`config`] - `.packlint.yml` loading and merging
//! - [`content`] - Content types, artifacts and the loader
//! - [`error`] - Error types and result aliases
//! - [`format`] - Formatter pipeline and docker tag resolution
//! - [`git`] - Git change discovery
//! - [`graph`] - The content graph and its queries
//! - [`prepare`] - Marketplace variant preparation
//! - [`release_notes`] - Release-note parsing helpers
//! - [`ui`] - Interactive prompts, spinners, and terminal output
//! - [`validate`] - Validators, selection and the validate engine
//!
//! # Example
//!
//! ```
//! use packlint::prepare::replace_incident_words;
//!
//! let text = replace_incident_words("Close <-incident-> and incident");
//! assert_eq!(text, "Close <-incident-> and alert");
//! ```
//!
//! For end-to-end runs over a content tree, see the integration tests.

pub mod cli;
pub mod codec;
pub mod config;
pub mod content;
pub mod error;
pub mod format;
pub mod git;
pub mod graph;
pub mod prepare;
pub mod release_notes;
pub mod ui;
pub mod validate;

pub use error::{PacklintError, Result};
