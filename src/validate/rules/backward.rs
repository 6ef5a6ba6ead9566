//! Backward-compatibility rules (BC).
//!
//! Every rule here compares the working copy of an item with its version on
//! the base ref, so they only run on modified and renamed items that have
//! one.

use super::{join, ITEM_TYPES};
use crate::content::integration::{all_outputs, command_names, subtype};
use crate::content::{Artifact, ContentType, GitStatus};
use crate::error::{PacklintError, Result};
use crate::format::primitives::set_object_id;
use crate::validate::context::ValidationContext;
use crate::validate::results::{FixResult, ValidationResult};
use crate::validate::validator::{Validator, ValidatorInfo};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

const CHANGED: &[GitStatus] = &[GitStatus::Modified, GitStatus::Renamed];

fn with_base<'a>(items: &'a [&'a Artifact]) -> impl Iterator<Item = (&'a Artifact, &'a Artifact)> + 'a {
    items
        .iter()
        .filter_map(|item| item.old_base.as_deref().map(|old| (*item, old)))
}

fn no_base(code: &str, path: &Path) -> PacklintError {
    PacklintError::FixUnavailable {
        code: code.to_string(),
        message: format!("{} has no base version to restore from", path.display()),
    }
}

/// BC100: the id of an existing item must not change.
pub struct IdUnchanged;

impl Validator for IdUnchanged {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BC100",
            description: "Validate that the id of an existing content item was not changed.",
            rationale: "Other content and customer configurations refer to items by id.",
            error_message: "ID of content item was changed from {0} to {1}, please undo.",
            fix_message: Some("Changing ID back to {0}."),
            related_field: "id",
            content_types: ITEM_TYPES,
            git_statuses: Some(CHANGED),
            auto_fixable: true,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(with_base(items)
            .filter(|(item, old)| item.object_id() != old.object_id())
            .map(|(item, old)| self.result(item, &[&old.object_id(), &item.object_id()]))
            .collect())
    }

    fn fix(&self, item: &mut Artifact, _ctx: &ValidationContext<'_>) -> Result<FixResult> {
        let old_id = item
            .old_base
            .as_ref()
            .map(|old| old.object_id())
            .ok_or_else(|| no_base(self.code(), &item.path))?;
        set_object_id(item, &old_id);
        Ok(self.fix_result(item, &[&old_id]))
    }
}

/// BC101: the subtype of an integration or script must not change.
pub struct SubtypeUnchanged;

fn set_subtype(item: &mut Artifact, value: &str) {
    let section = match item.content_type {
        ContentType::Integration => item.data.get_mut("script"),
        _ => Some(&mut item.data),
    };
    if let Some(object) = section.and_then(Value::as_object_mut) {
        object.insert("subtype".into(), Value::String(value.to_string()));
    }
}

impl Validator for SubtypeUnchanged {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BC101",
            description: "Validate that the subtype of an integration or script was not changed.",
            rationale: "A different python subtype can break existing code paths.",
            error_message: "Possible backwards compatibility break, You've changed the {0} subtype from {1} to {2}, please undo.",
            fix_message: Some("Changing subtype back to ({0})."),
            related_field: "subtype",
            content_types: &[ContentType::Integration, ContentType::Script],
            git_statuses: Some(CHANGED),
            auto_fixable: true,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(with_base(items)
            .filter_map(|(item, old)| {
                let (Some(before), Some(after)) = (subtype(old), subtype(item)) else {
                    return None;
                };
                (before != after).then(|| self.result(item, &[&item.name(), &before, &after]))
            })
            .collect())
    }

    fn fix(&self, item: &mut Artifact, _ctx: &ValidationContext<'_>) -> Result<FixResult> {
        let before = item
            .old_base
            .as_deref()
            .and_then(subtype)
            .map(str::to_string)
            .ok_or_else(|| no_base(self.code(), &item.path))?;
        set_subtype(item, &before);
        Ok(self.fix_result(item, &[&before]))
    }
}

/// BC104: integration commands must not be removed.
pub struct CommandsKept;

impl Validator for CommandsKept {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BC104",
            description: "Validate that no integration command was removed.",
            rationale: "Playbooks calling a removed command stop working.",
            error_message: "Possible backwards compatibility break, the following commands were removed: {0}.",
            related_field: "script.commands",
            content_types: &[ContentType::Integration],
            git_statuses: Some(CHANGED),
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(with_base(items)
            .filter_map(|(item, old)| {
                let current: BTreeSet<String> = command_names(item).into_iter().collect();
                let removed: Vec<String> = command_names(old)
                    .into_iter()
                    .filter(|name| !current.contains(name))
                    .collect();
                (!removed.is_empty()).then(|| self.result(item, &[&join(&removed)]))
            })
            .collect())
    }
}

/// BC105: `fromversion` of an existing item must not change.
pub struct FromVersionUnchanged;

impl Validator for FromVersionUnchanged {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BC105",
            description: "Validate that the fromversion of an existing item was not changed.",
            rationale: "Changing fromversion silently removes the item from some platform versions.",
            error_message: "Changed fromversion field from {0} to {1}, please undo.",
            related_field: "fromversion",
            content_types: ITEM_TYPES,
            git_statuses: Some(CHANGED),
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(with_base(items)
            .filter_map(|(item, old)| {
                let before = old.declared_fromversion()?;
                let after = item.fromversion();
                (before != after).then(|| self.result(item, &[&before, &after]))
            })
            .collect())
    }
}

/// BC113: a mapper must keep its incident types and their mapped fields.
pub struct MapperKeysKept;

fn mapping(item: &Artifact) -> Option<&serde_json::Map<String, Value>> {
    item.data.get("mapping").and_then(Value::as_object)
}

fn internal_mapping_keys(entry: &Value) -> BTreeSet<&str> {
    entry
        .get("internalMapping")
        .and_then(Value::as_object)
        .map(|fields| fields.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

/// Removed incident types and removed fields of kept types.
fn removed_mapper_keys(item: &Artifact, old: &Artifact) -> Vec<String> {
    let (Some(before), Some(after)) = (mapping(old), mapping(item)) else {
        return Vec::new();
    };
    let mut removed = Vec::new();
    for (incident_type, old_entry) in before {
        match after.get(incident_type) {
            None => removed.push(format!("incident type {}", incident_type)),
            Some(new_entry) => {
                let kept = internal_mapping_keys(new_entry);
                let fields: Vec<&str> = internal_mapping_keys(old_entry)
                    .into_iter()
                    .filter(|field| !kept.contains(field))
                    .collect();
                if !fields.is_empty() {
                    removed.push(format!("fields of {}: {}", incident_type, join(&fields)));
                }
            }
        }
    }
    removed
}

impl Validator for MapperKeysKept {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BC113",
            description: "Validate that a mapper did not lose incident types or mapped fields.",
            rationale: "Removing mappings silently drops data from incoming incidents.",
            error_message: "The Mapper contains modified / removed keys: {0}",
            related_field: "mapping",
            content_types: &[ContentType::Mapper],
            git_statuses: Some(CHANGED),
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(with_base(items)
            .filter_map(|(item, old)| {
                let removed = removed_mapper_keys(item, old);
                (!removed.is_empty()).then(|| self.result(item, &[&removed.join("; ")]))
            })
            .collect())
    }
}

/// BC116: declared outputs must not be removed.
pub struct OutputsKept;

impl Validator for OutputsKept {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BC116",
            description: "Validate that no context output was removed.",
            rationale: "Playbooks reading a removed output stop working.",
            error_message: "The following output keys: {0} Has been removed, please undo.",
            related_field: "outputs",
            content_types: &[ContentType::Integration, ContentType::Script],
            git_statuses: Some(CHANGED),
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(with_base(items)
            .filter_map(|(item, old)| {
                let current: BTreeSet<(String, String)> = all_outputs(item).into_iter().collect();
                let mut removed: Vec<String> = Vec::new();
                for pair in all_outputs(old) {
                    if !current.contains(&pair) && !removed.contains(&pair.1) {
                        removed.push(pair.1);
                    }
                }
                (!removed.is_empty()).then(|| self.result(item, &[&join(&removed)]))
            })
            .collect())
    }
}

/// BC117: adding supported modules to an item needs approval.
///
/// New items count every module they declare as added.
pub struct SupportedModulesNotAdded;

fn added_modules(item: &Artifact) -> Vec<String> {
    let current = item.declared_modules().unwrap_or_default();
    if item.is_new() {
        return current;
    }
    let Some(old) = item.old_base.as_deref() else {
        return Vec::new();
    };
    let before = old.declared_modules().unwrap_or_default();
    current.into_iter().filter(|m| !before.contains(m)).collect()
}

impl Validator for SupportedModulesNotAdded {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BC117",
            description: "Checks whether supported modules have been added to the existing content item.",
            rationale: "Adding a support module for a content item requires a PM approval.",
            error_message: "The following support modules {0} have been added to the {1} {2}. Adding supported modules requires a PM approval.",
            related_field: "supportedModules",
            content_types: ITEM_TYPES,
            git_statuses: Some(&[GitStatus::Added, GitStatus::Modified]),
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
                let mut added = added_modules(item);
                added.sort();
                let quoted: Vec<String> = added.iter().map(|m| format!("'{}'", m)).collect();
                (!quoted.is_empty())
                    .then(|| self.result(item, &[&join(&quoted), &item.display_name(), &item.content_type]))
            })
            .collect())
    }
}
