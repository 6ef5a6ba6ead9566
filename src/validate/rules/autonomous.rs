//! Managed and autonomous pack rules (AS).

use super::{item_at, join};
use crate::content::playbook::tasks;
use crate::content::{Artifact, ContentType};
use crate::error::Result;
use crate::graph::{DependencyViolation, GraphNode};
use crate::validate::context::ValidationContext;
use crate::validate::results::{FixResult, ValidationResult};
use crate::validate::validator::{GraphRule, Validator, ValidatorInfo};
use serde_json::{json, Value};
use std::path::PathBuf;

fn dependency_results<V>(
    rule: &V,
    items: &[&Artifact],
    violations: Vec<DependencyViolation<'_>>,
) -> Vec<ValidationResult>
where
    V: GraphRule + ?Sized,
{
    let info = rule.info();
    violations
        .into_iter()
        .filter_map(|violation| {
            let item = item_at(items, violation.playbook.path.as_deref()?)?;
            let invalid: Vec<String> = violation.invalid.iter().map(ToString::to_string).collect();
            let message = crate::validate::validator::format_message(
                info.error_message,
                &[&item.object_id(), &join(&invalid)],
            );
            Some(ValidationResult::new(info.code, message, item))
        })
        .collect()
}

/// AS101: playbooks of managed packs only use managed or core content.
pub struct ManagedDependencies;

impl GraphRule for ManagedDependencies {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "AS101",
            description: "Validate that playbooks in managed packs only depend on managed or core content.",
            rationale: "Managed packs are released on their own schedule.",
            error_message: "The managed playbook '{0}' uses content that is neither in a core pack nor in a managed pack: {1}.",
            related_field: "tasks",
            content_types: &[ContentType::Playbook],
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items_using_graph(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
        paths: Option<&[PathBuf]>,
    ) -> Result<Vec<ValidationResult>> {
        let violations = ctx
            .graph
            .find_managed_playbooks_with_invalid_dependencies(paths, &ctx.run.core_packs);
        Ok(dependency_results(self, items, violations))
    }
}

/// AS102: playbooks of autonomous packs only use autonomous or core content.
pub struct AutonomousDependencies;

impl GraphRule for AutonomousDependencies {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "AS102",
            description: "Validate that playbooks in autonomous packs only depend on autonomous or core content.",
            rationale: "Autonomous packs run unattended and must be self-contained.",
            error_message: "The autonomous playbook '{0}' uses content that is neither in a core pack nor in an autonomous pack: {1}.",
            related_field: "tasks",
            content_types: &[ContentType::Playbook],
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items_using_graph(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
        paths: Option<&[PathBuf]>,
    ) -> Result<Vec<ValidationResult>> {
        let violations = ctx
            .graph
            .find_autonomous_playbooks_with_invalid_dependencies(paths, &ctx.run.core_packs);
        Ok(dependency_results(self, items, violations))
    }
}

/// AS102: unlabeled tasks of autonomous playbooks run quietly.
pub struct AutonomousQuietMode;

fn loud_tasks(item: &Artifact) -> Vec<String> {
    if !item.pack_metadata().is_some_and(|m| m.is_autonomous()) {
        return Vec::new();
    }
    tasks(&item.data)
        .iter()
        .filter(|t| !t.is_title() && !t.is_start())
        .filter(|t| t.display_label().is_none_or(str::is_empty))
        .filter(|t| t.quietmode() != Some(1))
        .map(|t| t.key().to_string())
        .collect()
}

impl Validator for AutonomousQuietMode {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "AS102",
            description: "Validate that unlabeled tasks in autonomous playbooks run in quiet mode.",
            rationale: "Autonomous playbooks only surface labeled tasks.",
            error_message: "The following tasks have no display label and must have quietmode set to 1: {0}.",
            fix_message: Some("Set quietmode to 1 on the following tasks: {0}."),
            related_field: "quietmode",
            content_types: &[ContentType::Playbook],
            auto_fixable: true,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(items
            .iter()
            .filter_map(|item| {
                let loud = loud_tasks(item);
                (!loud.is_empty()).then(|| self.result(item, &[&join(&loud)]))
            })
            .collect())
    }

    fn fix(&self, item: &mut Artifact, _ctx: &ValidationContext<'_>) -> Result<FixResult> {
        let loud = loud_tasks(item);
        for key in &loud {
            if let Some(Value::Object(task)) = item.data.pointer_mut(&format!("/tasks/{}", key)) {
                task.insert("quietmode".into(), json!(1));
            }
        }
        Ok(self.fix_result(item, &[&join(&loud)]))
    }
}

/// AS103: silent playbooks and silent triggers come in pairs within a pack.
pub struct SilentPairing;

fn node_is_silent(node: &GraphNode) -> bool {
    ["issilent", "isSilent", "is_silent"]
        .iter()
        .any(|key| node.attrs.get(*key).and_then(Value::as_bool).unwrap_or(false))
}

impl SilentPairing {
    fn problem(&self, item: &Artifact, ctx: &ValidationContext<'_>) -> Option<String> {
        if !item.is_silent() {
            return None;
        }
        let pack = item.pack_name()?;
        match item.content_type {
            ContentType::Playbook => {
                let triggers = ctx.graph.search(
                    ContentType::Trigger,
                    &[("pack", json!(pack)), ("playbook_id", json!(item.object_id()))],
                );
                (!triggers.iter().any(|t| node_is_silent(t))).then(|| {
                    format!(
                        "The silent playbook '{}' has no silent trigger in pack {}.",
                        item.object_id(),
                        pack
                    )
                })
            }
            ContentType::Trigger => {
                let target = item.str_field("playbook_id").unwrap_or_default();
                let playbooks = ctx.graph.search(
                    ContentType::Playbook,
                    &[("pack", json!(pack)), ("object_id", json!(target))],
                );
                (!playbooks.iter().any(|p| node_is_silent(p))).then(|| {
                    format!(
                        "The silent trigger '{}' must point to a silent playbook in pack {}, found '{}'.",
                        item.display_name(),
                        pack,
                        target
                    )
                })
            }
            _ => None,
        }
    }
}

impl Validator for SilentPairing {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "AS103",
            description: "Validate that every silent playbook has a silent trigger in the same pack, and vice versa.",
            rationale: "A silent playbook only runs through its silent trigger.",
            error_message: "{0}",
            related_field: "issilent",
            content_types: &[ContentType::Playbook, ContentType::Trigger],
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(items
            .iter()
            .filter_map(|item| {
                self.problem(item, ctx)
                    .map(|problem| self.result(item, &[&problem]))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::graph::test_support::{item, pack, pack_item, playbook_using, script};
    use crate::validate::validator::{AllFilesMode, ListFilesMode};

    fn quiet_playbook() -> Artifact {
        let meta = pack("Auto", json!({"managed": true, "source": "autonomous"}));
        item(
            "Auto",
            &meta,
            ContentType::Playbook,
            "Playbooks/p.yml",
            json!({
                "id": "p", "name": "p", "starttaskid": "t1",
                "tasks": {
                    "t1": {"type": "start", "nexttasks": {"#none#": ["t2"]}},
                    "t2": {"type": "title", "displayLabel": "X", "nexttasks": {"#none#": ["t3"]}},
                    "t3": {"type": "regular", "displayLabel": "", "quietmode": null, "nexttasks": {"#none#": ["t4"]}},
                    "t4": {"type": "regular", "displayLabel": null, "quietmode": 1}
                }
            }),
        )
    }

    #[test]
    fn unlabeled_tasks_get_quiet_mode() {
        let mut playbook = quiet_playbook();
        let results = check(&AutonomousQuietMode, &[playbook.clone()]);
        assert_eq!(codes(&results), vec!["AS102"]);
        assert_eq!(
            results[0].message,
            "The following tasks have no display label and must have quietmode set to 1: t3."
        );

        fix(&AutonomousQuietMode, &mut playbook);
        assert_eq!(playbook.data["tasks"]["t3"]["quietmode"], 1);
        assert!(check(&AutonomousQuietMode, &[playbook]).is_empty());
    }

    #[test]
    fn quiet_mode_only_applies_to_autonomous_packs() {
        let mut playbook = quiet_playbook();
        playbook.pack = None;
        assert!(check(&AutonomousQuietMode, &[playbook]).is_empty());
    }

    #[test]
    fn autonomous_dependency_outside_core_fails() {
        let auto = pack("Auto", json!({"managed": true, "source": "autonomous"}));
        let other = pack("Other", json!({}));
        let items = vec![
            pack_item("Auto", &auto),
            pack_item("Other", &other),
            playbook_using("Auto", &auto, "AutoPB", "Helper"),
            script("Other", &other, "Helper", json!({})),
        ];
        let results = check(&AllFilesMode(AutonomousDependencies), &items);
        assert_eq!(codes(&results), vec!["AS102"]);
        assert!(results[0].message.contains("'AutoPB'"));
        assert!(results[0].message.ends_with(": Helper."));
        assert!(results[0].path.ends_with("Playbooks/AutoPB.yml"));

        let list_mode = check(&ListFilesMode(AutonomousDependencies), &items);
        assert_eq!(list_mode.len(), 1);
    }

    #[test]
    fn core_dependencies_are_allowed() {
        let managed = pack("M", json!({"managed": true}));
        let base = pack("Base", json!({}));
        let items = vec![
            playbook_using("M", &managed, "MPB", "BaseScript"),
            script("Base", &base, "BaseScript", json!({})),
        ];
        assert!(check(&AllFilesMode(ManagedDependencies), &items).is_empty());
    }

    fn silent_pair(trigger_playbook: &str) -> Vec<Artifact> {
        let meta = pack("A", json!({}));
        vec![
            item(
                "A",
                &meta,
                ContentType::Playbook,
                "Playbooks/silent-p.yml",
                json!({"id": "silent-p", "name": "silent-p", "issilent": true}),
            ),
            item(
                "A",
                &meta,
                ContentType::Trigger,
                "Triggers/t.json",
                json!({"id": "silent-t", "trigger_name": "silent-t", "issilent": true, "playbook_id": trigger_playbook}),
            ),
        ]
    }

    #[test]
    fn silent_playbook_and_trigger_pair_up() {
        assert!(check(&SilentPairing, &silent_pair("silent-p")).is_empty());

        let results = check(&SilentPairing, &silent_pair("other"));
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].message,
            "The silent playbook 'silent-p' has no silent trigger in pack A."
        );
        assert!(results[1].message.ends_with("found 'other'."));
    }
}
