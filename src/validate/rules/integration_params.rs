//! Integration parameter rules (IN).

use super::join;
use crate::content::integration::{param_name, params};
use crate::content::{Artifact, ContentType, GitStatus, Marketplace};
use crate::error::Result;
use crate::validate::context::ValidationContext;
use crate::validate::results::{FixResult, ValidationResult};
use crate::validate::validator::{Validator, ValidatorInfo};
use serde_json::Value;
use std::collections::BTreeSet;

/// Parameters the platform manages itself and which may always be hidden.
const ALLOWED_HIDDEN_PARAMS: &[&str] = &["longRunning", "feedIncremental", "feedReputation"];

/// Parameter types that a type-9 credentials parameter can replace.
const REPLACEABLE_TYPES: &[i64] = &[0, 4, 12, 14];
const CREDENTIALS_TYPE: i64 = 9;

/// IN124: parameters that may not be hidden.
pub struct HiddenParams;

fn param_type(param: &Value) -> Option<i64> {
    param.get("type").and_then(Value::as_i64)
}

fn param_display<'a>(param: &'a Value, key: &str) -> &'a str {
    param.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Hidden everywhere: `true`, or a marketplace list naming all of them.
fn hidden_everywhere(param: &Value) -> bool {
    match param.get("hidden") {
        Some(Value::Bool(hidden)) => *hidden,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Array(list)) => {
            let named: BTreeSet<Marketplace> = list
                .iter()
                .filter_map(Value::as_str)
                .filter_map(Marketplace::parse)
                .collect();
            named.len() == Marketplace::ALL.len()
        }
        _ => false,
    }
}

fn replaced_by_credentials(param: &Value, all: &[&Value]) -> bool {
    if !param_type(param).is_some_and(|t| REPLACEABLE_TYPES.contains(&t)) {
        return false;
    }
    let display = param_display(param, "display").to_lowercase();
    all.iter().any(|other| {
        param_type(other) == Some(CREDENTIALS_TYPE)
            && (param_display(other, "display").to_lowercase() == display
                || param_display(other, "displaypassword").to_lowercase() == display)
    })
}

fn hidden_before(item: &Artifact, param: &Value) -> bool {
    let Some(old) = item.old_base.as_deref() else {
        return false;
    };
    params(old)
        .into_iter()
        .find(|p| param_name(p) == param_name(param))
        .is_some_and(|p| p.get("hidden") == param.get("hidden"))
}

fn invalid_hidden_params(item: &Artifact) -> Vec<String> {
    let all = params(item);
    all.iter()
        .filter(|param| hidden_everywhere(param))
        .filter(|param| {
            !(ALLOWED_HIDDEN_PARAMS.contains(&param_name(param))
                || replaced_by_credentials(param, &all)
                || hidden_before(item, param))
        })
        .map(|param| param_name(param).to_string())
        .collect()
}

impl Validator for HiddenParams {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "IN124",
            description: "Validate that a param is not hidden if it can not be hidden.",
            rationale: "Hidden parameters can stop an integration from working as expected.",
            error_message: "The following fields are hidden and cannot be hidden, please unhide them: {0}.",
            fix_message: Some("Unhid the following params {0}."),
            related_field: "configuration, hidden",
            content_types: &[ContentType::Integration],
            git_statuses: Some(&[GitStatus::Modified, GitStatus::Renamed]),
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
                let invalid = invalid_hidden_params(item);
                (!invalid.is_empty()).then(|| self.result(item, &[&join(&invalid)]))
            })
            .collect())
    }

    fn fix(&self, item: &mut Artifact, _ctx: &ValidationContext<'_>) -> Result<FixResult> {
        let invalid = invalid_hidden_params(item);
        if let Some(Value::Array(configuration)) = item.data.get_mut("configuration") {
            for param in configuration.iter_mut() {
                if invalid.iter().any(|name| name == param_name(param)) {
                    if let Some(object) = param.as_object_mut() {
                        object.insert("hidden".into(), Value::Bool(false));
                    }
                }
            }
        }
        Ok(self.fix_result(item, &[&join(&invalid)]))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::content::artifact::test_support::artifact;
    use serde_json::json;

    fn integration(configuration: Value) -> Artifact {
        let mut item = artifact(
            ContentType::Integration,
            "Integrations/Foo/Foo.yml",
            json!({"commonfields": {"id": "Foo"}, "configuration": configuration}),
        );
        item.git_status = Some(GitStatus::Modified);
        item
    }

    #[test]
    fn hidden_params_are_reported_and_unhidden() {
        let mut item = integration(json!([
            {"name": "url", "type": 0, "hidden": true},
            {"name": "longRunning", "type": 8, "hidden": true},
            {"name": "proxy", "type": 8, "hidden": false}
        ]));
        let results = check(&HiddenParams, &[item.clone()]);
        assert_eq!(
            results[0].message,
            "The following fields are hidden and cannot be hidden, please unhide them: url."
        );

        let fixed = fix(&HiddenParams, &mut item);
        assert_eq!(fixed.message, "Unhid the following params url.");
        assert_eq!(item.data["configuration"][0]["hidden"], false);
        assert_eq!(item.data["configuration"][1]["hidden"], true);
        assert!(check(&HiddenParams, &[item]).is_empty());
    }

    #[test]
    fn credentials_replacement_allows_hiding() {
        let item = integration(json!([
            {"name": "apikey", "display": "API Key", "type": 4, "hidden": true},
            {"name": "credentials", "type": 9, "displaypassword": "API Key"}
        ]));
        assert!(check(&HiddenParams, &[item]).is_empty());
    }

    #[test]
    fn hidden_in_every_marketplace_counts() {
        let all: Vec<&str> = Marketplace::ALL.iter().map(|m| m.as_str()).collect();
        let item = integration(json!([
            {"name": "partial", "type": 0, "hidden": ["xsoar"]},
            {"name": "full", "type": 0, "hidden": all}
        ]));
        let results = check(&HiddenParams, &[item]);
        assert!(results[0].message.ends_with("unhide them: full."));
    }

    #[test]
    fn already_hidden_params_are_kept() {
        let mut item = integration(json!([{"name": "url", "type": 0, "hidden": true}]));
        item.old_base = Some(Box::new(item.clone()));
        assert!(check(&HiddenParams, &[item]).is_empty());
    }
}
