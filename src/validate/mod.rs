//! Content validation.
//!
//! A run has four passes, each finishing before the next starts:
//!
//! 1. [`selection`] loads the requested items (all files, explicit paths, or
//!    the git change set)
//! 2. [`engine::build_graph`] builds the content graph over the whole root
//! 3. [`engine::ValidateEngine`] runs every enabled validator over the items
//!    that apply to it
//! 4. with `--fix`, the engine applies fixes and writes changed files
//!
//! Validators live in [`rules`]; [`output`] renders the final report.

pub mod context;
pub mod engine;
pub mod ignore;
pub mod output;
pub mod registry;
pub mod results;
pub mod rules;
pub mod selection;
pub mod validator;

pub use context::{CancellationToken, ExecutionMode, RunContext, ValidationContext};
pub use engine::{build_graph, ValidateEngine, EXCEPTION_ERROR_CODE};
pub use ignore::PackIgnore;
pub use output::{HumanFormatter, JsonFormatter, OutputFormat, ReportFormatter};
pub use registry::ValidatorRegistry;
pub use results::{FixOutcome, FixResult, RunReport, Severity, ValidationResult};
pub use selection::{select, should_run, Selection, SelectionInput, CLASSIFICATION_ERROR_CODE};
pub use validator::{AllFilesMode, GraphRule, ListFilesMode, Validator, ValidatorInfo};

use crate::content::ContentLoader;
use crate::error::Result;

/// Select, build the graph and run `registry` in one call.
///
/// The run context's pack ignores are loaded from the selected items.
pub fn run_validation(
    run: RunContext,
    input: &SelectionInput,
    registry: &ValidatorRegistry,
) -> Result<RunReport> {
    let mut loader = ContentLoader::new();
    let selection = select(&run.content_root, input, &mut loader)?;
    let run = run.with_pack_ignores(&selection.items);
    let graph = build_graph(&run, &mut loader, &selection.items);
    ValidateEngine::new(registry).run(&run, selection, &graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &std::path::Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn identity_mismatch_is_fixed_end_to_end() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Packs/W/pack_metadata.json", r#"{"name": "W", "currentVersion": "1.0.0"}"#);
        write(
            temp.path(),
            "Packs/W/Wizards/wizard-w.json",
            r#"{"id": "should_fix", "name": "Right", "version": -1, "fromVersion": "6.8.0"}"#,
        );
        let registry = ValidatorRegistry::with_builtins();
        let mut run = RunContext::new(temp.path(), ExecutionMode::AllFiles).with_fix(true);
        run.select.insert("BA101".into());

        let report = run_validation(run.clone(), &SelectionInput::All, &registry).unwrap();
        assert_eq!(report.results.len(), 1);
        assert!(report.results[0].message.contains("Right"));
        assert!(report.results[0].message.contains("should_fix"));
        assert!(report.results[0].is_fixed());

        let rerun = run_validation(run.with_fix(false), &SelectionInput::All, &registry).unwrap();
        assert!(rerun.results.is_empty());
    }
}
