//! Basic rules (BA): identity, versions and text hygiene.

use super::{copyright_lines, internal_terms, join, ITEM_TYPES};
use crate::content::integration::{all_outputs, command_name, commands, param_name, params};
use crate::content::{Artifact, ContentType, GitStatus, Marketplace, RelatedFileKind, Support};
use crate::content::version::is_lower;
use crate::error::Result;
use crate::format::primitives::{
    minimum_fromversion, object_id_pointer, raise_fromversion, set_version_to_default,
    trim_id_and_name, version_marker,
};
use crate::validate::context::ValidationContext;
use crate::validate::results::{FixResult, ValidationResult};
use crate::validate::validator::{Validator, ValidatorInfo};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static MARKETPLACE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)~([^>]*)>").expect("valid tag regex"));

/// Every string value in a document, depth first.
fn strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(list) => list.iter().for_each(|v| strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| strings(v, out)),
        _ => {}
    }
}

fn tag_names(raw: &str) -> Vec<String> {
    raw.split(',').map(|t| t.trim().to_string()).collect()
}

/// BA100: `version` must be -1.
pub struct VersionIsDefault;

impl Validator for VersionIsDefault {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BA100",
            description: "Validate that the version is set to -1.",
            rationale: "Content versions are managed by the platform.",
            error_message: "The version for our files should always be -1, please update the file.",
            fix_message: Some("Updated the version to -1."),
            related_field: "version",
            content_types: ITEM_TYPES,
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
            .filter(|item| version_marker(item) != Some(-1))
            .map(|item| self.result(item, &[]))
            .collect())
    }

    fn fix(&self, item: &mut Artifact, _ctx: &ValidationContext<'_>) -> Result<FixResult> {
        set_version_to_default(item);
        Ok(self.fix_result(item, &[]))
    }
}

/// BA101: the id must equal the name.
pub struct IdEqualsName;

/// Types whose legacy items may keep a diverging name unless newly added.
const NAME_CHURN_TYPES: &[ContentType] = &[
    ContentType::Dashboard,
    ContentType::IncidentType,
    ContentType::Classifier,
];

impl Validator for IdEqualsName {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BA101",
            description: "Validate that the ID of the content item is the same as its name.",
            rationale: "Matching ids and names keep references unambiguous.",
            error_message: "The name attribute (currently {0}) should be identical to its `id` attribute ({1})",
            fix_message: Some("Changing name to be equal to id ({0})."),
            related_field: "name",
            content_types: &[
                ContentType::Integration,
                ContentType::Script,
                ContentType::Playbook,
                ContentType::TestPlaybook,
                ContentType::Classifier,
                ContentType::Mapper,
                ContentType::Dashboard,
                ContentType::IncidentField,
                ContentType::IncidentType,
                ContentType::IndicatorField,
                ContentType::GenericField,
                ContentType::GenericType,
                ContentType::GenericModule,
                ContentType::GenericDefinition,
                ContentType::Widget,
                ContentType::Wizard,
                ContentType::Job,
                ContentType::List,
                ContentType::Report,
                ContentType::ParsingRule,
                ContentType::ModelingRule,
                ContentType::CorrelationRule,
            ],
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
            .filter(|item| {
                !NAME_CHURN_TYPES.contains(&item.content_type)
                    || item.git_status == Some(GitStatus::Added)
            })
            .filter(|item| item.object_id() != item.name())
            .map(|item| self.result(item, &[&item.name(), &item.object_id()]))
            .collect())
    }

    fn fix(&self, item: &mut Artifact, _ctx: &ValidationContext<'_>) -> Result<FixResult> {
        let id = item.object_id();
        if let Some(object) = item.data.as_object_mut() {
            object.insert("name".into(), Value::String(id.clone()));
        }
        Ok(self.fix_result(item, &[&id]))
    }
}

/// BA102: marketplace tags may only name known marketplaces.
pub struct UnknownMarketplaceTags;

impl Validator for UnknownMarketplaceTags {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BA102",
            description: "Validate that marketplace tags only reference known marketplaces.",
            rationale: "Unknown tags are never stripped and leak into shipped content.",
            error_message: "The following marketplace tags are unknown: {0}. Known marketplaces are: {1}.",
            content_types: ITEM_TYPES,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        let known = join(&Marketplace::ALL.map(Marketplace::as_str));
        let mut results = Vec::new();
        for item in items {
            let mut texts = Vec::new();
            strings(&item.data, &mut texts);
            let mut unknown: Vec<String> = Vec::new();
            for text in texts {
                for caps in MARKETPLACE_TAG.captures_iter(text) {
                    for tag in tag_names(&caps[2]) {
                        if Marketplace::parse(&tag).is_none() && !unknown.contains(&tag) {
                            unknown.push(tag);
                        }
                    }
                }
            }
            if !unknown.is_empty() {
                results.push(self.result(item, &[&join(&unknown), &known]));
            }
        }
        Ok(results)
    }
}

/// BA104: marketplace tags must balance and never nest.
pub struct MalformedMarketplaceTags;

/// Problems with the tag structure of one string.
pub(crate) fn tag_structure_problems(text: &str) -> Vec<String> {
    let mut problems = Vec::new();
    let mut open: Option<String> = None;
    for caps in MARKETPLACE_TAG.captures_iter(text) {
        let closing = !caps[1].is_empty();
        let tag = caps[2].trim().to_string();
        match (open.take(), closing) {
            (None, false) => open = Some(tag),
            (Some(outer), false) => {
                problems.push(format!("<~{}> is nested inside <~{}>", tag, outer));
                open = Some(outer);
            }
            (Some(outer), true) if outer == tag => {}
            (Some(outer), true) => problems.push(format!("</~{}> closes <~{}>", tag, outer)),
            (None, true) => problems.push(format!("</~{}> has no opening tag", tag)),
        }
    }
    if let Some(tag) = open {
        problems.push(format!("<~{}> is never closed", tag));
    }
    problems
}

impl Validator for MalformedMarketplaceTags {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BA104",
            description: "Validate that marketplace tags are balanced and not nested.",
            rationale: "Malformed tags cannot be stripped reliably when preparing content.",
            error_message: "The marketplace tags are malformed: {0}.",
            content_types: ITEM_TYPES,
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
            let mut texts = Vec::new();
            strings(&item.data, &mut texts);
            let problems: Vec<String> = texts.into_iter().flat_map(tag_structure_problems).collect();
            if !problems.is_empty() {
                results.push(self.result(item, &[&problems.join("; ")]));
            }
        }
        Ok(results)
    }
}

/// BA106: `fromversion` must reach the minimum for the item's type.
pub struct FromVersionSufficient;

impl Validator for FromVersionSufficient {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BA106",
            description: "Validate that the fromversion is high enough for the content type.",
            rationale: "Older platforms cannot load these items.",
            error_message: "The {0} from version field is either missing or insufficient, need at least {1}, current is {2}.",
            fix_message: Some("Raised the fromversion field to {0}."),
            related_field: "fromversion",
            content_types: &[
                ContentType::Integration,
                ContentType::Script,
                ContentType::Playbook,
                ContentType::Classifier,
                ContentType::Mapper,
                ContentType::Dashboard,
                ContentType::IncidentField,
                ContentType::IncidentType,
                ContentType::IndicatorType,
                ContentType::Layout,
                ContentType::ParsingRule,
                ContentType::ModelingRule,
                ContentType::CorrelationRule,
                ContentType::XDRCTemplate,
                ContentType::GenericField,
                ContentType::GenericType,
                ContentType::GenericModule,
                ContentType::GenericDefinition,
                ContentType::Trigger,
                ContentType::Widget,
                ContentType::Wizard,
                ContentType::Job,
                ContentType::List,
                ContentType::Report,
            ],
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
                is_lower(&item.fromversion(), minimum).then(|| {
                    self.result(item, &[&item.content_type, &minimum, &item.fromversion()])
                })
            })
            .collect())
    }

    fn fix(&self, item: &mut Artifact, _ctx: &ValidationContext<'_>) -> Result<FixResult> {
        let minimum = minimum_fromversion(item);
        raise_fromversion(item, minimum);
        Ok(self.fix_result(item, &[&item.fromversion()]))
    }
}

/// BA113: no trailing whitespace in id or name.
pub struct NoTrailingSpaces;

fn trailing_space_fields(item: &Artifact) -> Vec<&'static str> {
    let mut fields = Vec::new();
    let padded = |value: Option<&Value>| {
        value
            .and_then(Value::as_str)
            .is_some_and(|s| s.trim_end().len() != s.len())
    };
    if padded(item.data.pointer(object_id_pointer(item.content_type))) {
        fields.push("id");
    }
    if padded(item.data.get("name")) {
        fields.push("name");
    }
    fields
}

impl Validator for NoTrailingSpaces {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BA113",
            description: "Validate that the id and name have no trailing spaces.",
            rationale: "Trailing spaces break lookups by id or name.",
            error_message: "The following fields have a trailing spaces: {0}.",
            fix_message: Some("Removed trailing spaces from the {0} fields of the content item."),
            content_types: ITEM_TYPES,
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
                let fields = trailing_space_fields(item);
                (!fields.is_empty()).then(|| self.result(item, &[&join(&fields)]))
            })
            .collect())
    }

    fn fix(&self, item: &mut Artifact, _ctx: &ValidationContext<'_>) -> Result<FixResult> {
        let fields = trailing_space_fields(item);
        trim_id_and_name(item);
        Ok(self.fix_result(item, &[&join(&fields)]))
    }
}

/// BA119: no copyright words in code or test code.
pub struct NoCopyrightInCode;

impl Validator for NoCopyrightInCode {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BA119",
            description: "Validate that code files do not contain copyright keywords.",
            rationale: "Content is shipped under a single license.",
            error_message: "Invalid keywords related to Copyrights (BSD, MIT, Copyright, proprietary) were found in lines: {0}.",
            content_types: &[ContentType::Integration, ContentType::Script],
            related_files: &[RelatedFileKind::Code, RelatedFileKind::TestCode],
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
            if item.object_id() == "CommonServerPython" {
                continue;
            }
            for kind in [RelatedFileKind::Code, RelatedFileKind::TestCode] {
                let Some(file) = item.related_file(kind) else { continue };
                if !file.exist() {
                    continue;
                }
                let lines = copyright_lines(file.text());
                if lines.is_empty() {
                    continue;
                }
                let lines: Vec<String> = lines.iter().map(usize::to_string).collect();
                results.push(self.result(item, &[&join(&lines)]).with_path(file.path()));
            }
        }
        Ok(results)
    }
}

/// BA125: customer-facing fields must not use internal terms.
pub struct NoInternalTerms;

/// (field label, text) pairs shown to customers.
fn customer_facing_fields(item: &Artifact) -> Vec<(String, &str)> {
    let mut fields = Vec::new();
    for key in ["description", "comment"] {
        if let Some(text) = item.str_field(key) {
            fields.push((key.to_string(), text));
        }
    }
    for command in commands(item) {
        let name = command_name(command);
        collect_descriptions(&format!("command {}", name), command, &mut fields);
    }
    if item.content_type == ContentType::Script {
        collect_descriptions("script", &item.data, &mut fields);
    }
    for param in params(item) {
        if let Some(text) = param.get("additionalinfo").and_then(Value::as_str) {
            let name = param_name(param);
            fields.push((format!("parameter {} additionalinfo", name), text));
        }
    }
    fields
}

fn collect_descriptions<'a>(owner: &str, section: &'a Value, out: &mut Vec<(String, &'a str)>) {
    if owner != "script" {
        if let Some(text) = section.get("description").and_then(Value::as_str) {
            out.push((format!("{} description", owner), text));
        }
    }
    for (list, key) in [("arguments", "name"), ("args", "name"), ("outputs", "contextPath")] {
        let Some(entries) = section.get(list).and_then(Value::as_array) else {
            continue;
        };
        for entry in entries {
            let Some(text) = entry.get("description").and_then(Value::as_str) else {
                continue;
            };
            let name = entry.get(key).and_then(Value::as_str).unwrap_or_default();
            out.push((format!("{} {} {}", owner, list, name), text));
        }
    }
}

impl Validator for NoInternalTerms {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BA125",
            description: "Validate that customer-facing fields do not use internal terms.",
            rationale: "Product and command internals must not leak into documentation.",
            error_message: "Customer facing content must not contain internal terms ({0}); found in: {1}.",
            content_types: &[ContentType::Integration, ContentType::Script, ContentType::Playbook],
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
            let mut terms: Vec<&str> = Vec::new();
            let mut fields: Vec<String> = Vec::new();
            for (field, text) in customer_facing_fields(item) {
                let found = internal_terms(text);
                if found.is_empty() {
                    continue;
                }
                for term in found {
                    if !terms.contains(&term) {
                        terms.push(term);
                    }
                }
                fields.push(field);
            }
            if !fields.is_empty() {
                results.push(self.result(item, &[&join(&terms), &join(&fields)]));
            }
        }
        Ok(results)
    }
}

/// BA127: context output paths of new xsoar-supported items are at most five levels deep.
pub struct ContextPathDepth;

const MAX_CONTEXT_DEPTH: usize = 5;

impl Validator for ContextPathDepth {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "BA127",
            description: "Validate that context output paths are at most five levels deep.",
            rationale: "Deep context paths are hard to use in playbooks.",
            error_message: "The level of depth for context output path for {0} in the yml should be less or equal to 5, check the following outputs:\n{1}",
            related_field: "contextPath",
            content_types: &[ContentType::Integration, ContentType::Script],
            git_statuses: Some(&[GitStatus::Added]),
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        let mut results = Vec::new();
        for item in items.iter().filter(|i| i.support() == Support::Xsoar) {
            let deep: Vec<String> = all_outputs(item)
                .into_iter()
                .filter(|(_, path)| path.split('.').count() > MAX_CONTEXT_DEPTH)
                .map(|(command, path)| format!("{}: {}", command, path))
                .collect();
            if !deep.is_empty() {
                results.push(self.result(item, &[&item.name(), &deep.join("\n")]));
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::content::artifact::test_support::{artifact, artifact_in_pack};
    use crate::content::PackMetadata;
    use serde_json::json;
    use tempfile::TempDir;

    fn wizard(id: &str, name: &str) -> Artifact {
        artifact(
            ContentType::Wizard,
            "Wizards/w.json",
            json!({"id": id, "name": name, "version": -1, "fromVersion": "6.8.0"}),
        )
    }

    #[test]
    fn version_must_be_minus_one() {
        let mut item = wizard("w", "w");
        item.data["version"] = json!(3);
        let results = check(&VersionIsDefault, &[item.clone(), wizard("x", "x")]);
        assert_eq!(results.len(), 1);

        fix(&VersionIsDefault, &mut item);
        assert_eq!(item.data["version"], -1);
    }

    #[test]
    fn id_name_mismatch_is_reported_and_fixed() {
        let mut item = wizard("should_fix", "Right");
        let results = check(&IdEqualsName, &[item.clone()]);
        assert_eq!(results.len(), 1);
        assert!(results[0].message.contains("Right"));
        assert!(results[0].message.contains("should_fix"));
        assert!(results[0].fix_available);

        let fixed = fix(&IdEqualsName, &mut item);
        assert_eq!(item.name(), "should_fix");
        assert!(fixed.message.contains("should_fix"));
        assert!(check(&IdEqualsName, &[item]).is_empty());
    }

    #[test]
    fn legacy_dashboards_may_keep_their_names() {
        let mut dashboard = artifact(
            ContentType::Dashboard,
            "Dashboards/d.json",
            json!({"id": "d", "name": "Dash"}),
        );
        dashboard.git_status = Some(GitStatus::Modified);
        assert!(check(&IdEqualsName, &[dashboard.clone()]).is_empty());

        dashboard.git_status = Some(GitStatus::Added);
        assert_eq!(check(&IdEqualsName, &[dashboard]).len(), 1);
    }

    #[test]
    fn unknown_marketplace_tags() {
        let item = artifact(
            ContentType::Script,
            "Scripts/s/s.yml",
            json!({"comment": "Hi <~xsoar,xsiam>there</~xsoar,xsiam>"}),
        );
        let results = check(&UnknownMarketplaceTags, &[item]);
        assert_eq!(results.len(), 1);
        assert!(results[0].message.starts_with("The following marketplace tags are unknown: xsiam."));
    }

    #[test]
    fn tag_structure() {
        assert!(tag_structure_problems("<~xsoar>a</~xsoar> and <~xpanse>b</~xpanse>").is_empty());
        assert_eq!(
            tag_structure_problems("<~xsoar><~xpanse>a</~xpanse></~xsoar>"),
            vec![
                "<~xpanse> is nested inside <~xsoar>".to_string(),
                "</~xpanse> closes <~xsoar>".to_string(),
                "</~xsoar> has no opening tag".to_string(),
            ]
        );
        assert_eq!(
            tag_structure_problems("<~xsoar>open"),
            vec!["<~xsoar> is never closed".to_string()]
        );
    }

    #[test]
    fn malformed_tags_are_reported_once_per_item() {
        let item = artifact(
            ContentType::Playbook,
            "Playbooks/p.yml",
            json!({"description": "<~xsoar>x", "tasks": {"1": {"task": {"description": "</~xpanse>"}}}}),
        );
        let results = check(&MalformedMarketplaceTags, &[item]);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn feed_integration_needs_5_5_0() {
        let mut item = artifact(
            ContentType::Integration,
            "Integrations/F/F.yml",
            json!({"commonfields": {"id": "F"}, "name": "F", "fromversion": "5.4.9", "script": {"feed": true}}),
        );
        let results = check(&FromVersionSufficient, &[item.clone()]);
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].message,
            "The Integration from version field is either missing or insufficient, need at least 5.5.0, current is 5.4.9."
        );

        fix(&FromVersionSufficient, &mut item);
        assert_eq!(item.fromversion(), "5.5.0");
        fix(&FromVersionSufficient, &mut item);
        assert_eq!(item.fromversion(), "5.5.0");
    }

    #[test]
    fn sufficient_fromversion_passes() {
        let item = artifact(
            ContentType::Playbook,
            "Playbooks/p.yml",
            json!({"fromversion": "6.0.0"}),
        );
        assert!(check(&FromVersionSufficient, &[item]).is_empty());
    }

    #[test]
    fn trailing_spaces_are_trimmed() {
        let mut item = artifact(
            ContentType::Script,
            "Scripts/s/s.yml",
            json!({"commonfields": {"id": "s "}, "name": "s"}),
        );
        let results = check(&NoTrailingSpaces, &[item.clone()]);
        assert_eq!(results[0].message, "The following fields have a trailing spaces: id.");

        fix(&NoTrailingSpaces, &mut item);
        assert_eq!(item.object_id(), "s");
        assert!(check(&NoTrailingSpaces, &[item]).is_empty());
    }

    #[test]
    fn copyright_in_code_is_reported_against_the_code_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Packs/P/Scripts/S");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("S.py"), "x = 1\n# Copyright Foo\n").unwrap();

        let mut item = artifact(ContentType::Script, "Scripts/S/S.yml", json!({"commonfields": {"id": "S"}}));
        item.path = dir.join("S.yml");
        item.attach_related(Default::default());

        let results = check(&NoCopyrightInCode, &[item]);
        assert_eq!(results.len(), 1);
        assert!(results[0].message.ends_with("lines: 2."));
        assert_eq!(results[0].path, dir.join("S.py"));
    }

    #[test]
    fn internal_terms_in_argument_descriptions() {
        let item = artifact(
            ContentType::Integration,
            "Integrations/I/I.yml",
            json!({
                "commonfields": {"id": "I"},
                "description": "Talks to the service.",
                "script": {"commands": [{
                    "name": "i-get",
                    "description": "Get from Demisto.",
                    "arguments": [{"name": "a", "description": "Run test-module first."}]
                }]}
            }),
        );
        let results = check(&NoInternalTerms, &[item]);
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].message,
            "Customer facing content must not contain internal terms (demisto, test-module); found in: command i-get description, command i-get arguments a."
        );
    }

    #[test]
    fn deep_context_paths_on_xsoar_items() {
        let data = json!({
            "commonfields": {"id": "I"},
            "name": "I",
            "script": {"commands": [{
                "name": "i-get",
                "outputs": [
                    {"contextPath": "A.B.C.D.E.F"},
                    {"contextPath": "A.B"}
                ]
            }]}
        });
        let item = artifact(ContentType::Integration, "Integrations/I/I.yml", data.clone());
        let results = check(&ContextPathDepth, &[item]);
        assert_eq!(results.len(), 1);
        assert!(results[0].message.ends_with("i-get: A.B.C.D.E.F"));

        let partner = artifact_in_pack(
            ContentType::Integration,
            "Integrations/I/I.yml",
            data,
            PackMetadata {
                support: "partner".into(),
                ..Default::default()
            },
        );
        assert!(check(&ContextPathDepth, &[partner]).is_empty());
    }
}
