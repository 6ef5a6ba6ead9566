//! Format command implementation.
//!
//! `packlint format` rewrites the given items, then validates them unless
//! `--no-validate` is set.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::args::FormatArgs;
use crate::config::PacklintConfig;
use crate::error::Result;
use crate::format::{DockerHubResolver, DockerResolver, FormatOptions, FormatReport, Formatter};
use crate::git::GitCli;
use crate::ui::UserInterface;
use crate::validate::{run_validation, ExecutionMode, RunContext, SelectionInput, ValidatorRegistry};

use super::dispatcher::{Command, CommandResult, EXIT_FAILED, EXIT_NOT_VALIDATED};
use super::interrupt::interrupt_token;
use super::validate::print_report;

/// The format command implementation.
pub struct FormatCommand {
    content_root: PathBuf,
    config: PacklintConfig,
    args: FormatArgs,
    use_color: bool,
}

impl FormatCommand {
    /// Create a new format command.
    pub fn new(content_root: &Path, config: PacklintConfig, args: FormatArgs) -> Self {
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

    fn options(&self) -> FormatOptions {
        FormatOptions {
            output: self.args.output.clone(),
            from_version: self.args.from_version.clone(),
            assume_yes: self.args.assume_yes || self.config.format.assume_yes,
            update_docker: self.args.update_docker || self.config.format.update_docker,
        }
    }

    fn report(&self, report: &FormatReport, ui: &mut dyn UserInterface) {
        for (path, reason) in &report.failures {
            ui.error(&format!("{}: {}", path.display(), reason));
        }
        for file in &report.files {
            if file.written {
                ui.success(&format!("Formatted {}", file.path.display()));
            } else {
                ui.message(&format!("{} is already formatted", file.path.display()));
            }
            if ui.output_mode().shows_detail() {
                for step in &file.steps {
                    ui.message(&format!("  {}", step));
                }
            }
        }
    }

    fn validate(&self) -> Result<i32> {
        let input = SelectionInput::Paths(self.args.input.clone());
        let run = RunContext::new(&self.content_root, ExecutionMode::SpecificFiles)
            .with_config(&self.config.validate)
            .with_core_packs(self.config.graph.core_packs.clone())
            .with_cancellation(interrupt_token());
        let report = run_validation(run, &input, &ValidatorRegistry::with_builtins())?;
        print_report(&report, &self.content_root, false, self.use_color)?;
        Ok(report.exit_code())
    }
}

impl Command for FormatCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let options = self.options();
        let resolver = if options.update_docker {
            Some(DockerHubResolver::new(&self.config.docker)?)
        } else {
            None
        };

        let mut formatter = Formatter::new(&self.content_root, options);
        if let Some(resolver) = &resolver {
            formatter = formatter.with_docker_resolver(resolver as &dyn DockerResolver);
        }
        if self.content_root.join(".git").exists() {
            formatter = formatter.with_git(
                Arc::new(GitCli::new(&self.content_root)),
                self.config.git.base_ref.clone(),
            );
        }

        let report = formatter.run(&self.args.input, ui)?;
        self.report(&report, ui);
        if !report.is_success() {
            return Ok(CommandResult::failure(EXIT_FAILED));
        }
        if self.args.no_validate {
            ui.message("Skipped validation of the formatted files");
            return Ok(CommandResult::from_exit_code(EXIT_NOT_VALIDATED));
        }
        Ok(CommandResult::from_exit_code(self.validate()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn list(root: &Path) -> PathBuf {
        let path = root.join("Packs/L/Lists/list-l.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(root.join("Packs/L/pack_metadata.json"), r#"{"name": "L", "currentVersion": "1.0.0"}"#).unwrap();
        fs::write(&path, r#"{"id": "l", "name": "l", "version": 3, "data": "x", "description": null}"#).unwrap();
        path
    }

    #[test]
    fn no_validate_exits_three() {
        let temp = TempDir::new().unwrap();
        let path = list(temp.path());
        let args = FormatArgs {
            input: vec![path.clone()],
            no_validate: true,
            ..Default::default()
        };
        let mut ui = MockUI::new();
        let result = FormatCommand::new(temp.path(), PacklintConfig::default(), args)
            .execute(&mut ui)
            .unwrap();
        assert_eq!(result.exit_code, 3);
        assert!(ui.successes()[0].contains("list-l.json"));

        let (data, _) = crate::codec::load(&path).unwrap();
        assert_eq!(data["version"], -1);
        assert!(data.get("description").is_none());
    }

    #[test]
    fn config_enables_assume_yes() {
        let temp = TempDir::new().unwrap();
        let mut config = PacklintConfig::default();
        config.format.assume_yes = true;
        let cmd = FormatCommand::new(temp.path(), config, FormatArgs::default());
        assert!(cmd.options().assume_yes);
        assert!(!cmd.options().update_docker);
    }
}
