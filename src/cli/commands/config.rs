//! Config-schema command implementation.
//!
//! The `packlint config-schema` command prints the JSON schema of
//! `.packlint.yml`, for editor integration.

use crate::config::config_json_schema;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The config-schema command implementation.
pub struct ConfigSchemaCommand;

impl Command for ConfigSchemaCommand {
    fn execute(&self, _ui: &mut dyn UserInterface) -> Result<CommandResult> {
        println!("{}", config_json_schema()?);
        Ok(CommandResult::success())
    }
}
