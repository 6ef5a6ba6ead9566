//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::config::{load_config, PacklintConfig};
use crate::error::Result;
use crate::ui::UserInterface;

/// Exit code for a clean run.
pub const EXIT_OK: i32 = 0;
/// Exit code when validation found errors.
pub const EXIT_FAILED: i32 = 1;
/// Exit code when the run could not be performed.
pub const EXIT_INVALID: i32 = 2;
/// Exit code when `format` ran but its validate step was skipped.
pub const EXIT_NOT_VALIDATED: i32 = 3;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: EXIT_OK,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Result carrying `exit_code`; only 0 counts as success.
    pub fn from_exit_code(exit_code: i32) -> Self {
        Self {
            success: exit_code == EXIT_OK,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    content_root: PathBuf,
    config_path: Option<PathBuf>,
    use_color: bool,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given content root.
    pub fn new(content_root: PathBuf) -> Self {
        Self {
            content_root,
            config_path: None,
            use_color: false,
        }
    }

    /// Load config from exactly this file.
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    /// Get the content root path.
    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    fn config(&self) -> Result<PacklintConfig> {
        load_config(&self.content_root, self.config_path.as_deref())
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Commands::Validate(args) => {
                let cmd = super::validate::ValidateCommand::new(
                    &self.content_root,
                    self.config()?,
                    args.clone(),
                )
                .with_color(self.use_color);
                cmd.execute(ui)
            }
            Commands::Format(args) => {
                let cmd =
                    super::format::FormatCommand::new(&self.content_root, self.config()?, args.clone())
                        .with_color(self.use_color);
                cmd.execute(ui)
            }
            Commands::Prepare(args) => {
                let cmd = super::prepare::PrepareCommand::new(&self.content_root, args.clone());
                cmd.execute(ui)
            }
            Commands::ListRules(args) => {
                let cmd = super::list::ListRulesCommand::new(args.clone());
                cmd.execute(ui)
            }
            Commands::ConfigSchema => super::config::ConfigSchemaCommand.execute(ui),
            Commands::Completions(args) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(ui)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(EXIT_INVALID);
        assert!(!result.success);
        assert_eq!(result.exit_code, 2);
    }

    #[test]
    fn not_validated_is_not_success() {
        let result = CommandResult::from_exit_code(EXIT_NOT_VALIDATED);
        assert!(!result.success);
        assert_eq!(result.exit_code, 3);
    }

    #[test]
    fn dispatcher_creation() {
        let dispatcher = CommandDispatcher::new(PathBuf::from("/test"));
        assert_eq!(dispatcher.content_root(), Path::new("/test"));
    }
}
