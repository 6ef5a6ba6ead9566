//! Command-line interface for packlint.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, CompletionsArgs, FormatArgs, ListRulesArgs, PrepareArgs, ValidateArgs,
};
pub use commands::{Command, CommandDispatcher, CommandResult};
