//! Incident and indicator field rules (IF).

use super::join;
use crate::content::version::is_lower;
use crate::content::{Artifact, ContentType, GitStatus};
use crate::error::Result;
use crate::format::primitives::{minimum_fromversion, raise_fromversion};
use crate::validate::context::ValidationContext;
use crate::validate::results::{FixResult, ValidationResult};
use crate::validate::validator::{Validator, ValidatorInfo};
use serde_json::Value;

/// IF109: rules for required fields.
///
/// A required field may not be associated to all types, may not change its
/// `required` flag, and may only gain associations to types added in the
/// same change.
pub struct RequiredFieldRules;

fn is_required(item: &Artifact) -> bool {
    item.data.get("required").and_then(Value::as_bool).unwrap_or(false)
}

fn associated_types(item: &Artifact) -> Vec<String> {
    item.data
        .get("associatedTypes")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

impl Validator for RequiredFieldRules {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "IF109",
            description: "Validate the required flag of incident fields.",
            rationale: "Required fields block existing incidents of the associated types.",
            error_message: "{0}",
            related_field: "required",
            content_types: &[ContentType::IncidentField],
            git_statuses: Some(&[GitStatus::Added, GitStatus::Modified]),
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        let added_types: Vec<String> = ctx
            .selected
            .iter()
            .filter(|i| i.content_type == ContentType::IncidentType && i.is_new())
            .flat_map(|i| [i.object_id(), i.name()])
            .collect();

        let mut results = Vec::new();
        for item in items {
            let mut problems: Vec<String> = Vec::new();
            let required = is_required(item);
            let associated_to_all = item
                .data
                .get("associatedToAll")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            if required && associated_to_all {
                problems.push("A required field should not be associated with all types.".into());
            }

            let old = item.old_base.as_deref();
            if item.git_status == Some(GitStatus::Modified) {
                if let Some(old) = old {
                    if is_required(old) != required {
                        problems.push("Required value should not be changed.".into());
                    }
                }
            }

            if required {
                let before = old.map(associated_types).unwrap_or_default();
                let not_new: Vec<String> = associated_types(item)
                    .into_iter()
                    .filter(|t| !before.contains(t) && !added_types.contains(t))
                    .collect();
                if !not_new.is_empty() {
                    problems.push(format!(
                        "A required field may only be associated with newly added types, but it was associated with: {}.",
                        join(&not_new)
                    ));
                }
            }

            if !problems.is_empty() {
                results.push(self.result(item, &[&problems.join(" ")]));
            }
        }
        Ok(results)
    }
}

/// IF112: indicator fields of some types need a higher fromversion.
pub struct IndicatorFieldFromVersion;

impl Validator for IndicatorFieldFromVersion {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "IF112",
            description: "Validate that indicator fields of type html or grid have a sufficient fromversion.",
            rationale: "Older platforms cannot render these field types.",
            error_message: "The fromversion of an indicator field of type {0} must be at least {1}, current is {2}.",
            fix_message: Some("Raised the fromversion field to {0}."),
            related_field: "fromVersion",
            content_types: &[ContentType::IndicatorField],
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
                let minimum = minimum_fromversion(item);
                let field_type = item.str_field("type").unwrap_or("unknown");
                is_lower(&item.fromversion(), minimum)
                    .then(|| self.result(item, &[&field_type, &minimum, &item.fromversion()]))
            })
            .collect())
    }

    fn fix(&self, item: &mut Artifact, _ctx: &ValidationContext<'_>) -> Result<FixResult> {
        let minimum = minimum_fromversion(item);
        raise_fromversion(item, minimum);
        Ok(self.fix_result(item, &[&item.fromversion()]))
    }
}
