//! List-rules command implementation.
//!
//! Prints the validator catalog: one line per validator, or a JSON array
//! with `--json`. Codes shared by two validators appear twice.

use std::io::Write;

use serde::Serialize;

use crate::cli::args::ListRulesArgs;
use crate::error::Result;
use crate::ui::UserInterface;
use crate::validate::ValidatorRegistry;

use super::dispatcher::{Command, CommandResult};

#[derive(Debug, Serialize)]
struct RuleEntry {
    code: &'static str,
    description: &'static str,
    auto_fixable: bool,
}

fn catalog(registry: &ValidatorRegistry) -> Vec<RuleEntry> {
    let mut entries: Vec<RuleEntry> = registry
        .iter()
        .map(|v| {
            let info = v.info();
            RuleEntry {
                code: info.code,
                description: info.description,
                auto_fixable: info.auto_fixable,
            }
        })
        .collect();
    entries.sort_by(|a, b| a.code.cmp(b.code).then(a.description.cmp(b.description)));
    entries
}

fn render<W: Write>(entries: &[RuleEntry], json: bool, out: &mut W) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, entries).map_err(std::io::Error::other)?;
        writeln!(out)?;
    } else {
        for entry in entries {
            let fix = if entry.auto_fixable { "fix" } else { "   " };
            writeln!(out, "{}  {}  {}", entry.code, fix, entry.description)?;
        }
    }
    Ok(())
}

/// The list-rules command implementation.
pub struct ListRulesCommand {
    args: ListRulesArgs,
}

impl ListRulesCommand {
    pub fn new(args: ListRulesArgs) -> Self {
        Self { args }
    }
}

impl Command for ListRulesCommand {
    fn execute(&self, _ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let entries = catalog(&ValidatorRegistry::with_builtins());
        let stdout = std::io::stdout();
        render(&entries, self.args.json, &mut stdout.lock())?;
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_sorted_and_marks_fixes() {
        let entries = catalog(&ValidatorRegistry::with_builtins());
        assert!(entries.windows(2).all(|w| w[0].code <= w[1].code));
        let ba101 = entries.iter().find(|e| e.code == "BA101").unwrap();
        assert!(ba101.auto_fixable);
        let bc116 = entries.iter().find(|e| e.code == "BC116").unwrap();
        assert!(!bc116.auto_fixable);
    }

    #[test]
    fn json_catalog_has_three_fields() {
        let entries = catalog(&ValidatorRegistry::with_builtins());
        let mut out = Vec::new();
        render(&entries[..1], true, &mut out).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let keys: Vec<&String> = parsed[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["code", "description", "auto_fixable"]);
    }

    #[test]
    fn text_catalog_is_one_line_per_rule() {
        let entries = catalog(&ValidatorRegistry::with_builtins());
        let mut out = Vec::new();
        render(&entries, false, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), entries.len());
    }
}
