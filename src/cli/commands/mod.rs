//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. Reports go to stdout; status
//! messages go through the [`UserInterface`](crate::ui::UserInterface) to
//! stderr.

pub mod completions;
pub mod config;
pub mod dispatcher;
pub mod format;
pub mod interrupt;
pub mod list;
pub mod prepare;
pub mod validate;

pub use dispatcher::{
    Command, CommandDispatcher, CommandResult, EXIT_FAILED, EXIT_INVALID, EXIT_NOT_VALIDATED, EXIT_OK,
};
