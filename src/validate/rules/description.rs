//! Description rules (DS).

use super::{internal_terms, join};
use crate::content::{Artifact, ContentType, GitStatus, RelatedFileKind};
use crate::error::Result;
use crate::validate::context::ValidationContext;
use crate::validate::results::{FixResult, ValidationResult};
use crate::validate::validator::{Validator, ValidatorInfo};
use serde_json::Value;

/// DS107: the integration description file must not use internal terms.
pub struct DescriptionFileTerms;

impl Validator for DescriptionFileTerms {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "DS107",
            description: "Validate that the description file does not use internal terms.",
            rationale: "The description file is shown to customers as-is.",
            error_message: "The description file contains internal terms: {0}.",
            content_types: &[ContentType::Integration],
            related_files: &[RelatedFileKind::Description],
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        let mut results = Vec::new();
        for item in items {
            let Some(file) = item.related_file(RelatedFileKind::Description) else {
                continue;
            };
            let terms = internal_terms(file.text());
            if !terms.is_empty() {
                results.push(self.result(item, &[&join(&terms)]).with_path(file.path()));
            }
        }
        Ok(results)
    }
}

/// DS108: descriptions must end with a period.
pub struct DescriptionsEndWithDot;

/// A description field: its JSON pointer and a label for messages.
struct DescriptionField {
    pointer: String,
    label: String,
}

fn list_fields(section: &Value, base: &str, owner: &str, out: &mut Vec<DescriptionField>) {
    for (list, key) in [("arguments", "name"), ("args", "name"), ("outputs", "contextPath")] {
        let Some(entries) = section.get(list).and_then(Value::as_array) else {
            continue;
        };
        for (index, entry) in entries.iter().enumerate() {
            if entry.get("description").is_none() {
                continue;
            }
            let name = entry.get(key).and_then(Value::as_str).unwrap_or_default();
            out.push(DescriptionField {
                pointer: format!("{}/{}/{}/description", base, list, index),
                label: format!("{} {} {}", owner, list, name),
            });
        }
    }
}

fn description_fields(item: &Artifact) -> Vec<DescriptionField> {
    let mut fields = Vec::new();
    match item.content_type {
        ContentType::Integration => {
            fields.push(DescriptionField {
                pointer: "/description".into(),
                label: "description".into(),
            });
            let commands = item
                .data
                .pointer("/script/commands")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            for (index, command) in commands.iter().enumerate() {
                let name = command.get("name").and_then(Value::as_str).unwrap_or_default();
                let base = format!("/script/commands/{}", index);
                fields.push(DescriptionField {
                    pointer: format!("{}/description", base),
                    label: format!("command {}", name),
                });
                list_fields(command, &base, &format!("command {}", name), &mut fields);
            }
        }
        ContentType::Script => {
            fields.push(DescriptionField {
                pointer: "/comment".into(),
                label: "comment".into(),
            });
            list_fields(&item.data, "", "script", &mut fields);
        }
        _ => {}
    }
    fields
}

/// Whether a description ends the way a sentence should.
fn ends_properly(text: &str) -> bool {
    let text = text.trim().trim_matches(|c| c == '"' || c == '\'').trim_end();
    if text.is_empty() {
        return true;
    }
    if text.ends_with(['.', '?', '!']) {
        return true;
    }
    text.split_whitespace()
        .last()
        .is_some_and(|word| word.starts_with("http://") || word.starts_with("https://"))
}

fn invalid_fields(item: &Artifact) -> Vec<DescriptionField> {
    description_fields(item)
        .into_iter()
        .filter(|field| {
            item.data
                .pointer(&field.pointer)
                .and_then(Value::as_str)
                .is_some_and(|text| !ends_properly(text))
        })
        .collect()
}

impl Validator for DescriptionsEndWithDot {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "DS108",
            description: "Validate that descriptions end with a period.",
            rationale: "Consistent punctuation in generated documentation.",
            error_message: "The following descriptions do not end with a period:\n{0}",
            fix_message: Some("Added a period to the end of the following descriptions:\n{0}"),
            related_field: "description",
            content_types: &[ContentType::Integration, ContentType::Script],
            git_statuses: Some(&[GitStatus::Added, GitStatus::Modified]),
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
                let labels: Vec<String> = invalid_fields(item).into_iter().map(|f| f.label).collect();
                (!labels.is_empty()).then(|| self.result(item, &[&labels.join("\n")]))
            })
            .collect())
    }

    fn fix(&self, item: &mut Artifact, _ctx: &ValidationContext<'_>) -> Result<FixResult> {
        let fields = invalid_fields(item);
        for field in &fields {
            if let Some(Value::String(text)) = item.data.pointer_mut(&field.pointer) {
                let trimmed = text.trim_end().to_string();
                *text = format!("{}.", trimmed);
            }
        }
        let labels: Vec<String> = fields.into_iter().map(|f| f.label).collect();
        Ok(self.fix_result(item, &[&labels.join("\n")]))
    }
}
