//! Marketplace variant preparation.
//!
//! Content is written once and shipped to several marketplaces. Before a
//! document goes to `marketplacev2`, the user-facing "incident" wording in
//! its name, description and task texts becomes "alert". Authors keep a
//! word as is by wrapping it: `<-incident->`. The wrappers are removed from
//! those same texts for every marketplace. Scripts and task arguments
//! are never rewritten.
//!
//! Replacement always runs before wrapper stripping.

use crate::codec::{self, DocumentFormat};
use crate::content::Marketplace;
use crate::error::{PacklintError, Result};
use regex::{Captures, Regex};
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// A wrapped incident word, or a standalone one.
static INCIDENT_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<-[Ii]ncidents?->|\b[Ii]ncidents?\b").expect("valid regex"));

static WRAPPED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<-([Ii]ncidents?)->").expect("valid regex"));

/// Top-level keys whose text is user facing.
const TEXT_KEYS: &[&str] = &["name", "description"];

/// Task keys whose text is user facing.
const TASK_TEXT_KEYS: &[&str] = &["name", "description"];

/// A server key used as a task description; it is never rewritten.
const SERVER_KEY_DESCRIPTION: &str = "commands.local.cmd.set.incident";

fn to_alert(word: &str) -> &'static str {
    match word {
        "incident" => "alert",
        "Incident" => "Alert",
        "incidents" => "alerts",
        _ => "Alerts",
    }
}

/// Replace standalone incident words, leaving wrapped tokens alone.
pub fn replace_incident_words(text: &str) -> String {
    INCIDENT_WORD
        .replace_all(text, |caps: &Captures<'_>| {
            let matched = &caps[0];
            if matched.starts_with("<-") {
                matched.to_string()
            } else {
                to_alert(matched).to_string()
            }
        })
        .into_owned()
}

/// `<-incident->` becomes `incident`. Other `<-...->` text is left alone.
pub fn strip_wrappers(text: &str) -> String {
    WRAPPED.replace_all(text, "$1").into_owned()
}

fn prepare_text(text: &str, to_alerts: bool) -> String {
    if to_alerts {
        strip_wrappers(&replace_incident_words(text))
    } else {
        strip_wrappers(text)
    }
}

fn rewrite(slot: &mut Value, to_alerts: bool) -> bool {
    let Value::String(text) = slot else {
        return false;
    };
    let rewritten = prepare_text(text, to_alerts);
    if rewritten == *text {
        return false;
    }
    *text = rewritten;
    true
}

/// Rewrite the user-facing names and descriptions of `data`.
fn rewrite_texts(data: &mut Value, to_alerts: bool) -> bool {
    let mut changed = false;
    let tasks = data
        .get_mut("tasks")
        .and_then(Value::as_object_mut)
        .into_iter()
        .flat_map(|tasks| tasks.values_mut())
        .filter_map(|task| task.get_mut("task").and_then(Value::as_object_mut));
    for task in tasks {
        for key in TASK_TEXT_KEYS {
            let Some(slot) = task.get_mut(*key) else {
                continue;
            };
            if *key == "description" && slot.as_str() == Some(SERVER_KEY_DESCRIPTION) {
                continue;
            }
            changed |= rewrite(slot, to_alerts);
        }
    }
    if let Some(object) = data.as_object_mut() {
        for key in TEXT_KEYS {
            if let Some(slot) = object.get_mut(*key) {
                changed |= rewrite(slot, to_alerts);
            }
        }
    }
    changed
}

/// Prepare `data` for `marketplace` in place. Returns whether it changed.
///
/// Only task names and descriptions and the top-level name and description
/// are touched.
pub fn prepare(data: &mut Value, marketplace: Marketplace) -> bool {
    rewrite_texts(data, marketplace == Marketplace::MarketplaceV2)
}

/// Parse a marketplace name given on the command line.
pub fn parse_marketplace(name: &str) -> Result<Marketplace> {
    Marketplace::parse(name).ok_or_else(|| PacklintError::Prepare {
        message: format!(
            "Unknown marketplace '{}' (expected one of: {})",
            name,
            Marketplace::ALL.map(Marketplace::as_str).join(", ")
        ),
    })
}

/// Prepare the document at `input` and write it to `output` (or in place).
///
/// Returns whether the written document differs from the input.
pub fn prepare_file(input: &Path, marketplace: Marketplace, output: Option<&Path>) -> Result<bool> {
    let (original, format) = codec::load(input)?;
    if format == DocumentFormat::Markdown {
        return Err(PacklintError::Prepare {
            message: format!("{} is not a YAML or JSON document", input.display()),
        });
    }
    let mut data = original.clone();
    let changed = prepare(&mut data, marketplace);
    debug!("Prepared {} for {} (changed: {})", input.display(), marketplace, changed);
    match output {
        Some(output) => std::fs::write(output, codec::dump(&data, format)?)?,
        None => {
            codec::write_if_changed(input, &original, &data, format)?;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn playbook(task_name: &str) -> Value {
        json!({
            "id": "p",
            "name": "Close Incidents",
            "description": "Handles an incident.",
            "tasks": {"0": {"task": {"name": task_name, "description": "incidents here"}}},
        })
    }

    #[test]
    fn wrapped_words_survive_replacement() {
        let mut data = playbook("Create <-incident-> and incident");
        assert!(prepare(&mut data, Marketplace::MarketplaceV2));
        assert_eq!(data["tasks"]["0"]["task"]["name"], "Create incident and alert");
        assert_eq!(data["tasks"]["0"]["task"]["description"], "alerts here");
        assert_eq!(data["name"], "Close Alerts");
        assert_eq!(data["description"], "Handles an alert.");
    }

    #[test]
    fn other_marketplaces_only_strip_wrappers() {
        let mut data = playbook("Create <-incident-> and incident");
        assert!(prepare(&mut data, Marketplace::Xsoar));
        assert_eq!(data["tasks"]["0"]["task"]["name"], "Create incident and incident");
        assert_eq!(data["name"], "Close Incidents");
    }

    #[test]
    fn words_inside_identifiers_are_kept() {
        assert_eq!(replace_incident_words("incidentType and IncidentFields"), "incidentType and IncidentFields");
        assert_eq!(replace_incident_words("New incident."), "New alert.");
    }

    #[test]
    fn preparing_twice_is_stable() {
        for marketplace in [Marketplace::Xsoar, Marketplace::MarketplaceV2] {
            let mut once = playbook("Triage incidents");
            prepare(&mut once, marketplace);
            let mut twice = once.clone();
            assert!(!prepare(&mut twice, marketplace));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn code_and_arguments_are_untouched() {
        let mut data = json!({
            "name": "Triage <-incident->",
            "script": "x = a<-incident->c",
            "tasks": {"0": {
                "task": {"name": "Close incident"},
                "scriptarguments": {"value": {"simple": "keep <-incident-> and <-raw-> text"}}
            }}
        });
        assert!(prepare(&mut data, Marketplace::MarketplaceV2));
        assert_eq!(data["name"], "Triage incident");
        assert_eq!(data["script"], "x = a<-incident->c");
        assert_eq!(
            data["tasks"]["0"]["scriptarguments"]["value"]["simple"],
            "keep <-incident-> and <-raw-> text"
        );
        assert_eq!(data["tasks"]["0"]["task"]["name"], "Close alert");
    }

    #[test]
    fn only_incident_words_are_unwrapped() {
        assert_eq!(strip_wrappers("<-Incidents-> and <-raw->"), "Incidents and <-raw->");
    }

    #[test]
    fn server_key_description_is_kept() {
        let mut data = json!({
            "tasks": {"0": {"task": {
                "name": "Set <-incident-> field",
                "description": "commands.local.cmd.set.incident"
            }}}
        });
        assert!(prepare(&mut data, Marketplace::MarketplaceV2));
        assert_eq!(data["tasks"]["0"]["task"]["description"], "commands.local.cmd.set.incident");
        assert_eq!(data["tasks"]["0"]["task"]["name"], "Set incident field");
    }

    #[test]
    fn unknown_marketplace_is_rejected() {
        assert_eq!(parse_marketplace("marketplacev2").unwrap(), Marketplace::MarketplaceV2);
        assert!(matches!(parse_marketplace("nope"), Err(PacklintError::Prepare { .. })));
    }

    #[test]
    fn prepared_file_goes_to_output() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("playbook.yml");
        std::fs::write(&input, "id: p\nname: Close incident\n").unwrap();
        let output = temp.path().join("out.yml");
        assert!(prepare_file(&input, Marketplace::MarketplaceV2, Some(&output)).unwrap());
        assert_eq!(codec::load(&output).unwrap().0["name"], "Close alert");
        assert_eq!(codec::load(&input).unwrap().0["name"], "Close incident");
    }
}
