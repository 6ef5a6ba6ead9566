//! Prepare command implementation.

use std::path::{Path, PathBuf};

use crate::cli::args::PrepareArgs;
use crate::error::Result;
use crate::prepare::{parse_marketplace, prepare_file};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The prepare command implementation.
pub struct PrepareCommand {
    content_root: PathBuf,
    args: PrepareArgs,
}

impl PrepareCommand {
    pub fn new(content_root: &Path, args: PrepareArgs) -> Self {
        Self {
            content_root: content_root.to_path_buf(),
            args,
        }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.content_root.join(path)
        }
    }
}

impl Command for PrepareCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let marketplace = parse_marketplace(&self.args.marketplace)?;
        let input = self.absolute(&self.args.input);
        let output = self.args.output.as_deref().map(|p| self.absolute(p));
        let changed = prepare_file(&input, marketplace, output.as_deref())?;
        let target = output.as_deref().unwrap_or(&input);
        if changed {
            ui.success(&format!("Prepared {} for {}", target.display(), marketplace));
        } else {
            ui.message(&format!("{} needs no changes for {}", input.display(), marketplace));
        }
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use tempfile::TempDir;

    #[test]
    fn prepares_relative_input_in_place() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("p.yml"), "id: p\nname: Block <-Incident-> Incidents\n").unwrap();
        let args = PrepareArgs {
            input: PathBuf::from("p.yml"),
            marketplace: "marketplacev2".into(),
            output: None,
        };
        let mut ui = MockUI::new();
        let result = PrepareCommand::new(temp.path(), args).execute(&mut ui).unwrap();
        assert!(result.success);
        let (data, _) = crate::codec::load(&temp.path().join("p.yml")).unwrap();
        assert_eq!(data["name"], "Block Incident Alerts");
    }

    #[test]
    fn unknown_marketplace_is_an_error() {
        let temp = TempDir::new().unwrap();
        let args = PrepareArgs {
            input: PathBuf::from("p.yml"),
            marketplace: "moon".into(),
            output: None,
        };
        assert!(PrepareCommand::new(temp.path(), args)
            .execute(&mut MockUI::new())
            .is_err());
    }
}
