//! Validate command implementation.
//!
//! The `packlint validate` command selects items (all, explicit paths, or
//! the git change set), runs the rule catalog over them, and prints the
//! report to stdout.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::args::ValidateArgs;
use crate::config::PacklintConfig;
use crate::error::Result;
use crate::format::{DockerHubResolver, SharedResolver};
use crate::git::GitCli;
use crate::ui::UserInterface;
use crate::validate::{
    run_validation, HumanFormatter, JsonFormatter, ReportFormatter, RunContext, RunReport,
    SelectionInput, ValidatorRegistry,
};

use super::dispatcher::{Command, CommandResult};
use super::interrupt::interrupt_token;

/// The validate command implementation.
pub struct ValidateCommand {
    content_root: PathBuf,
    config: PacklintConfig,
    args: ValidateArgs,
    use_color: bool,
}

impl ValidateCommand {
    /// Create a new validate command.
    pub fn new(content_root: &Path, config: PacklintConfig, args: ValidateArgs) -> Self {
        Self {
            content_root: content_root.to_path_buf(),
            config,
            args,
            use_color: false,
        }
    }

    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    fn base_ref(&self) -> String {
        self.args
            .prev_ver
            .clone()
            .unwrap_or_else(|| self.config.git.base_ref.clone())
    }

    fn selection_input(&self) -> SelectionInput {
        if self.args.all {
            SelectionInput::All
        } else if !self.args.input.is_empty() {
            SelectionInput::Paths(self.args.input.clone())
        } else {
            SelectionInput::Git {
                provider: Arc::new(GitCli::new(&self.content_root)),
                base_ref: self.base_ref(),
            }
        }
    }

    /// Run context for `input`, with config, then command-line filters.
    pub fn run_context(&self, input: &SelectionInput) -> RunContext {
        let mut run = RunContext::new(&self.content_root, input.mode())
            .with_config(&self.config.validate)
            .with_core_packs(self.config.graph.core_packs.clone())
            .with_fix(self.args.fix);
        if matches!(input, SelectionInput::Git { .. }) {
            run = run.with_base_ref(self.base_ref());
        }
        run.select.extend(self.args.select.iter().cloned());
        run.ignore.extend(self.args.ignore.iter().cloned());
        run
    }
}

/// Print `report` to stdout as JSON or human-readable lines.
pub(crate) fn print_report(report: &RunReport, content_root: &Path, json: bool, use_color: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        JsonFormatter::new(content_root).format(report, &mut out)?;
    } else {
        HumanFormatter::new(content_root, use_color).format(report, &mut out)?;
    }
    out.flush()?;
    Ok(())
}

impl Command for ValidateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let input = self.selection_input();
        let mut run = self.run_context(&input).with_cancellation(interrupt_token());
        if self.args.check_docker || self.config.validate.check_docker_tags {
            run = run.with_docker_resolver(SharedResolver::new(DockerHubResolver::new(&self.config.docker)?));
        }
        let registry = ValidatorRegistry::with_builtins();

        let mut spinner = ui.start_spinner(&format!("Validating {}", input.mode()));
        let report = match run_validation(run, &input, &registry) {
            Ok(report) => report,
            Err(e) => {
                spinner.finish_error("Validation could not run");
                return Err(e);
            }
        };
        if report.cancelled {
            spinner.finish_error("Validation interrupted; partial results follow");
        } else if report.exit_code() == 0 {
            spinner.finish_success("Validation passed");
        } else {
            spinner.finish_error(&format!("{} problem(s) found", report.failures()));
        }

        print_report(&report, &self.content_root, self.args.json, self.use_color)?;

        if let Some(path) = &self.args.json_file {
            let mut file = std::fs::File::create(path)?;
            JsonFormatter::new(&self.content_root).format(&report, &mut file)?;
            ui.message(&format!("Wrote results to {}", path.display()));
        }
        for path in &report.written {
            ui.success(&format!("Fixed {}", path.display()));
        }

        Ok(CommandResult::from_exit_code(report.exit_code()))
    }
}
