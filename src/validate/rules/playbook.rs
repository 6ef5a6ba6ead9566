//! Playbook structure rules (PB).

use super::join;
use crate::content::playbook::{
    bfs_order, declared_inputs, referenced_inputs, referenced_task_keys, start_task_id, task, tasks,
    Task, DEFAULT_BRANCH,
};
use crate::content::{Artifact, ContentType, RelatedFileKind};
use crate::error::Result;
use crate::format::playbook::reconcile_task_uuids;
use crate::validate::context::ValidationContext;
use crate::validate::results::{FixResult, ValidationResult};
use crate::validate::validator::{Validator, ValidatorInfo};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use uuid::Uuid;

const PLAYBOOKS: &[ContentType] = &[ContentType::Playbook];
const ALL_PLAYBOOKS: &[ContentType] = &[ContentType::Playbook, ContentType::TestPlaybook];

/// Prefix every silent item's id and name carries.
pub(crate) const SILENT_PREFIX: &str = "silent-";

/// Run `check` on every item, reporting the task keys it returns.
fn per_task<V, F>(validator: &V, items: &[&Artifact], check: F) -> Vec<ValidationResult>
where
    V: Validator + ?Sized,
    F: Fn(&Artifact) -> Vec<String>,
{
    items
        .iter()
        .filter_map(|item| {
            let found = check(item);
            (!found.is_empty()).then(|| validator.result(item, &[&join(&found)]))
        })
        .collect()
}

/// PB100: playbooks must not restrict who may run them.
pub struct NoRolename;

fn has_rolename(item: &Artifact) -> bool {
    match item.data.get("rolename") {
        Some(Value::Array(roles)) => !roles.is_empty(),
        Some(Value::String(role)) => !role.is_empty(),
        _ => false,
    }
}

impl Validator for NoRolename {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB100",
            description: "Validate that the playbook does not have a rolename.",
            rationale: "A rolename hides the playbook from users without that role.",
            error_message: "The playbook '{0}' can not have a rolename, please remove the field.",
            fix_message: Some("Removed the 'rolename' from the following playbook '{0}'."),
            related_field: "rolename",
            content_types: PLAYBOOKS,
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
            .filter(|item| has_rolename(item))
            .map(|item| self.result(item, &[&item.name()]))
            .collect())
    }

    fn fix(&self, item: &mut Artifact, _ctx: &ValidationContext<'_>) -> Result<FixResult> {
        if let Some(object) = item.data.as_object_mut() {
            object.shift_remove("rolename");
        }
        Ok(self.fix_result(item, &[&item.name()]))
    }
}

/// A condition decided by a script's return value rather than by
/// `conditions` or reply options. Its branches cannot be matched to labels.
fn is_script_condition(t: &Task<'_>) -> bool {
    t.script_name().is_some()
        && t.value().get("conditions").is_none_or(Value::is_null)
        && t.value().get("message").is_none_or(Value::is_null)
}

/// Labels a condition task can be answered with, lowercased.
fn answer_labels(t: &Task<'_>) -> Vec<String> {
    let replies = t.reply_options();
    let labels = if replies.is_empty() {
        t.condition_labels()
    } else {
        replies
    };
    labels.into_iter().map(str::to_lowercase).collect()
}

fn branch_labels(t: &Task<'_>) -> Vec<String> {
    t.next_tasks()
        .into_iter()
        .map(|(label, _)| label)
        .filter(|label| *label != DEFAULT_BRANCH)
        .map(str::to_lowercase)
        .collect()
}

/// PB101: every branch of a condition task must be reachable.
///
/// A branch is unreachable when no condition or reply option produces its
/// label.
pub struct BranchesReachable;

impl Validator for BranchesReachable {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB101",
            description: "Validate that every branch of a condition task is reachable.",
            rationale: "Branches without a matching condition never run.",
            error_message: "The following condition branches are unreachable: {0}.",
            related_field: "conditions",
            content_types: ALL_PLAYBOOKS,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(per_task(self, items, |item| {
            tasks(&item.data)
                .iter()
                .filter(|t| t.is_condition() && !is_script_condition(t))
                .flat_map(|t| {
                    let answers = answer_labels(t);
                    branch_labels(t)
                        .into_iter()
                        .filter(move |label| !answers.contains(label))
                        .map(move |label| format!("task {} branch '{}'", t.key(), label))
                })
                .collect()
        }))
    }
}

/// PB102: every condition label and reply option needs a branch.
pub struct ConditionsHandled;

impl Validator for ConditionsHandled {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB102",
            description: "Validate that every condition of a condition task is handled.",
            rationale: "An answer without a branch stops the playbook.",
            error_message: "The following conditions are not handled by any branch: {0}.",
            related_field: "conditions",
            content_types: ALL_PLAYBOOKS,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(per_task(self, items, |item| {
            tasks(&item.data)
                .iter()
                .filter(|t| t.is_condition() && !is_script_condition(t))
                .flat_map(|t| {
                    let branches = branch_labels(t);
                    answer_labels(t)
                        .into_iter()
                        .filter(move |label| !branches.contains(label))
                        .map(move |label| format!("task {} condition '{}'", t.key(), label))
                })
                .collect()
        }))
    }
}

/// PB103: every task except the start task has a predecessor.
pub struct NoOrphanTasks;

impl Validator for NoOrphanTasks {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB103",
            description: "Validate that there are no orphan tasks in the playbook.",
            rationale: "Tasks that nothing points to never run.",
            error_message: "The following tasks ids have no previous tasks: {0}.",
            related_field: "tasks",
            content_types: ALL_PLAYBOOKS,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(per_task(self, items, |item| {
            let referenced = referenced_task_keys(&item.data);
            let start = start_task_id(&item.data);
            tasks(&item.data)
                .iter()
                .map(Task::key)
                .filter(|key| Some(*key) != start && !referenced.contains(*key))
                .map(str::to_string)
                .collect()
        }))
    }
}

static DEPRECATED_WITH_REPLACEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Deprecated\. Use .+ instead\.$").expect("valid regex"));
static DEPRECATED_NO_REPLACEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Deprecated\..*No available replacement\.$").expect("valid regex"));

/// PB104: deprecated playbooks name their replacement in a fixed format.
pub struct DeprecatedDescription;

impl Validator for DeprecatedDescription {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB104",
            description: "Validate the description of deprecated playbooks.",
            rationale: "Users need to know what replaces a deprecated playbook.",
            error_message: "The deprecated playbook '{0}' has invalid description. The description of deprecated playbooks should follow one of the formats:\n1. \"Deprecated. Use <PLAYBOOK_NAME> instead.\"\n2. \"Deprecated. <REASON> No available replacement.\"",
            related_field: "description",
            content_types: PLAYBOOKS,
            run_on_deprecated: true,
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
            .filter(|item| item.deprecated())
            .filter(|item| {
                let description = item.str_field("description").unwrap_or_default().trim();
                !(DEPRECATED_WITH_REPLACEMENT.is_match(description)
                    || DEPRECATED_NO_REPLACEMENT.is_match(description))
            })
            .map(|item| self.result(item, &[&item.name()]))
            .collect())
    }
}

/// PB105: no `DeleteContext` task clears the whole context.
pub struct NoDeleteContextAll;

impl Validator for NoDeleteContextAll {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB105",
            description: "Validate that no DeleteContext task deletes the entire context.",
            rationale: "Deleting the whole context breaks the incident for other playbooks.",
            error_message: "The playbook includes DeleteContext tasks with all set to 'yes', which is not permitted. Please correct the following tasks: {0}.",
            related_field: "tasks",
            content_types: PLAYBOOKS,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(per_task(self, items, |item| {
            tasks(&item.data)
                .iter()
                .filter(|t| t.script_name() == Some("DeleteContext"))
                .filter(|t| t.argument("all").is_some_and(|v| v.eq_ignore_ascii_case("yes")))
                .map(|t| t.key().to_string())
                .collect()
        }))
    }
}

/// PB106: tasks must not pin an integration instance.
pub struct NoPinnedInstance;

fn pinned_tasks(data: &Value) -> Vec<String> {
    tasks(data)
        .iter()
        .filter(|t| {
            t.script_arguments()
                .and_then(|args| args.get("using"))
                .is_some_and(|using| match using {
                    Value::Null => false,
                    Value::String(s) => !s.is_empty(),
                    other => other.get("simple").and_then(Value::as_str).is_some_and(|s| !s.is_empty()),
                })
        })
        .map(|t| t.key().to_string())
        .collect()
}

impl Validator for NoPinnedInstance {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB106",
            description: "Validate that no task uses a specific integration instance.",
            rationale: "Instance names differ between environments.",
            error_message: "The following tasks use a specific instance: {0}.",
            fix_message: Some("Removed the 'using' argument from the following tasks: {0}."),
            related_field: "scriptarguments.using",
            content_types: PLAYBOOKS,
            auto_fixable: true,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(per_task(self, items, |item| pinned_tasks(&item.data)))
    }

    fn fix(&self, item: &mut Artifact, _ctx: &ValidationContext<'_>) -> Result<FixResult> {
        let pinned = pinned_tasks(&item.data);
        for key in &pinned {
            let pointer = format!("/tasks/{}/scriptarguments", key);
            if let Some(Value::Object(args)) = item.data.pointer_mut(&pointer) {
                args.shift_remove("using");
            }
        }
        Ok(self.fix_result(item, &[&join(&pinned)]))
    }
}

fn is_uuid(value: Option<&str>) -> bool {
    value.is_some_and(|v| Uuid::parse_str(v).is_ok())
}

/// PB108: task ids are UUIDs.
pub struct TaskIdsAreUuids;

impl Validator for TaskIdsAreUuids {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB108",
            description: "Validate that the taskid and task.id fields are UUIDs.",
            rationale: "Task ids must be unique across playbooks.",
            error_message: "This playbook has tasks with invalid 'taskid' or invalid 'id' under the 'task' field: {0}. Please make sure both are UUIDs.",
            fix_message: Some("Generated new UUIDs for the tasks: {0}."),
            related_field: "taskid",
            content_types: ALL_PLAYBOOKS,
            auto_fixable: true,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(per_task(self, items, non_uuid_tasks))
    }

    fn fix(&self, item: &mut Artifact, _ctx: &ValidationContext<'_>) -> Result<FixResult> {
        let fixed = non_uuid_tasks(item);
        reconcile_task_uuids(&mut item.data);
        Ok(self.fix_result(item, &[&join(&fixed)]))
    }
}

fn non_uuid_tasks(item: &Artifact) -> Vec<String> {
    tasks(&item.data)
        .iter()
        .filter(|t| !is_uuid(t.taskid()) || !is_uuid(t.inner_id()))
        .map(|t| t.key().to_string())
        .collect()
}

/// PB109: `taskid` equals `task.id`.
pub struct TaskIdMatchesInnerId;

impl Validator for TaskIdMatchesInnerId {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB109",
            description: "Validate that the taskid field and the id under the task field are equal.",
            rationale: "The platform resolves tasks by either id.",
            error_message: "On tasks: {0}, the field 'taskid' and the 'id' under the 'task' field must be with equal value.",
            related_field: "taskid",
            content_types: ALL_PLAYBOOKS,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(per_task(self, items, |item| {
            tasks(&item.data)
                .iter()
                .filter(|t| t.taskid() != t.inner_id())
                .map(|t| t.key().to_string())
                .collect()
        }))
    }
}

/// PB118: every declared input is used.
pub struct DeclaredInputsUsed;

impl Validator for DeclaredInputsUsed {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB118",
            description: "Validate that all inputs described in the playbook's inputs section are used.",
            rationale: "Unused inputs confuse the playbook's callers.",
            error_message: "The following inputs are not used in the playbook: {0}",
            related_field: "inputs",
            content_types: PLAYBOOKS,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(per_task(self, items, |item| {
            let used = referenced_inputs(&item.data);
            declared_inputs(&item.data)
                .into_iter()
                .filter(|input| !used.contains(input))
                .collect()
        }))
    }
}

/// PB119: every used input is declared.
pub struct UsedInputsDeclared;

impl Validator for UsedInputsDeclared {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB119",
            description: "Validate that all inputs used in the playbook are declared in its inputs section.",
            rationale: "Undeclared inputs always resolve to nothing.",
            error_message: "The following inputs are used but not provided in the input section: {0}",
            related_field: "inputs",
            content_types: PLAYBOOKS,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(per_task(self, items, |item| {
            let declared = declared_inputs(&item.data);
            referenced_inputs(&item.data)
                .into_iter()
                .filter(|input| !declared.contains(input))
                .collect()
        }))
    }
}

/// PB125: a condition task needs more than its default branch.
pub struct ConditionHasOnlyDefault;

impl Validator for ConditionHasOnlyDefault {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB125",
            description: "Validate that condition tasks have branches besides the default one.",
            rationale: "A condition with only a default branch decides nothing.",
            error_message: "Playbook has conditional tasks with an empty or only a default branch: {0}.",
            related_field: "nexttasks",
            content_types: ALL_PLAYBOOKS,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(per_task(self, items, |item| {
            tasks(&item.data)
                .iter()
                .filter(|t| t.is_condition())
                .filter(|t| branch_labels(t).is_empty())
                .map(|t| t.key().to_string())
                .collect()
        }))
    }
}

fn has_silent_prefix(value: &str) -> bool {
    value.to_lowercase().starts_with(SILENT_PREFIX)
}

/// Whether the silent flag agrees with the id and name prefixes.
pub(crate) fn silent_prefix_consistent(item: &Artifact, id: &str, name: &str) -> bool {
    if item.is_silent() {
        has_silent_prefix(id) && has_silent_prefix(name)
    } else {
        !has_silent_prefix(id) && !has_silent_prefix(name)
    }
}

/// PB130: silent playbooks carry the silent prefix, and only they do.
pub struct SilentPlaybookPrefix;

impl Validator for SilentPlaybookPrefix {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB130",
            description: "Validate that silent playbooks have the 'silent-' prefix in their id and name.",
            rationale: "The prefix is how the platform recognizes silent playbooks.",
            error_message: "Silent playbooks must have 'issilent: true' and an id and name starting with 'silent-'; '{0}' does not follow this.",
            related_field: "issilent",
            content_types: PLAYBOOKS,
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
            .filter(|item| !silent_prefix_consistent(item, &item.object_id(), &item.name()))
            .map(|item| self.result(item, &[&item.name()]))
            .collect())
    }
}

/// PB131: silent playbooks are not documented.
pub struct SilentPlaybookHasNoReadme;

impl Validator for SilentPlaybookHasNoReadme {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB131",
            description: "Validate that silent playbooks do not have a README file.",
            rationale: "Silent playbooks are hidden from users.",
            error_message: "Silent playbooks should not have a README file, please remove {0}.",
            related_field: "issilent",
            content_types: PLAYBOOKS,
            related_files: &[RelatedFileKind::Readme],
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
            .filter(|item| item.is_silent())
            .filter_map(|item| {
                let readme = item.related_file(RelatedFileKind::Readme)?;
                readme
                    .exist()
                    .then(|| self.result(item, &[&readme.path().display()]))
            })
            .collect())
    }
}

/// Section headers of autonomous playbooks, in order, with whether each is required.
const AUTONOMOUS_SECTIONS: &[(&str, bool)] = &[
    ("Data Collection", true),
    ("Early Containment", false),
    ("Investigation", true),
    ("Verdict", true),
    ("Remediation", true),
];

/// Section titles in breadth-first order, restricted to the known sections.
fn section_titles(data: &Value) -> Vec<&'static str> {
    bfs_order(data)
        .iter()
        .filter_map(|key| task(data, key))
        .filter(|t| t.is_title())
        .filter_map(|t| {
            AUTONOMOUS_SECTIONS
                .iter()
                .map(|(name, _)| *name)
                .find(|name| name.eq_ignore_ascii_case(t.name().trim()))
        })
        .collect()
}

fn section_sequence_valid(titles: &[&str]) -> bool {
    let mut remaining = titles.iter().peekable();
    for (name, required) in AUTONOMOUS_SECTIONS {
        match remaining.peek() {
            Some(title) if **title == *name => {
                remaining.next();
            }
            _ if *required => return false,
            _ => {}
        }
    }
    remaining.next().is_none()
}

/// PB132: autonomous playbooks follow the fixed section sequence.
pub struct AutonomousHeaderSequence;

impl Validator for AutonomousHeaderSequence {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB132",
            description: "Validate the section headers of playbooks in autonomous packs.",
            rationale: "Autonomous playbooks are rendered section by section.",
            error_message: "The section headers of the playbook must be, in order: Data Collection, Early Containment (optional), Investigation, Verdict, Remediation. Found: {0}.",
            related_field: "tasks",
            content_types: PLAYBOOKS,
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
            .filter(|item| item.pack_metadata().is_some_and(|m| m.is_autonomous()))
            .filter(|item| !item.is_silent())
            .filter_map(|item| {
                let titles = section_titles(&item.data);
                (!section_sequence_valid(&titles)).then(|| {
                    let found = if titles.is_empty() {
                        "none".to_string()
                    } else {
                        join(&titles)
                    };
                    self.result(item, &[&found])
                })
            })
            .collect())
    }
}

/// PB133: silent triggers carry the silent prefix, and only they do.
pub struct SilentTriggerPrefix;

impl Validator for SilentTriggerPrefix {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB133",
            description: "Validate that silent triggers have the 'silent-' prefix in their id and name.",
            rationale: "The prefix is how the platform recognizes silent triggers.",
            error_message: "Silent triggers must have 'issilent: true' and an id and trigger name starting with 'silent-'; '{0}' does not follow this.",
            related_field: "issilent",
            content_types: &[ContentType::Trigger],
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
            .filter(|item| !silent_prefix_consistent(item, &item.object_id(), &item.display_name()))
            .map(|item| self.result(item, &[&item.display_name()]))
            .collect())
    }
}

/// Roots of context paths that are easy to pass "as value" by mistake.
const CONTEXT_ROOTS: &[&str] = &["incident.", "inputs."];

fn is_plain_reference(segment: &str) -> bool {
    CONTEXT_ROOTS.iter().any(|root| segment.starts_with(root))
}

fn plain_references(text: &str) -> Vec<String> {
    text.split(',')
        .filter(|segment| is_plain_reference(segment))
        .map(str::to_string)
        .collect()
}

/// Wrap every plain reference among the comma-separated segments in `${}`.
fn wrap_references(text: &str) -> String {
    text.split(',')
        .map(|segment| {
            if is_plain_reference(segment) {
                format!("${{{}}}", segment)
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn each_mut<'v>(value: Option<&'v mut Value>) -> impl Iterator<Item = &'v mut Value> {
    let items: Vec<&mut Value> = match value {
        Some(Value::Array(list)) => list.iter_mut().collect(),
        Some(Value::Object(map)) => map.values_mut().collect(),
        _ => Vec::new(),
    };
    items.into_iter()
}

/// Walks the string slots of a task that take a value literally.
///
/// `visit` sees every such slot that holds a string.
struct ValueSlots<'f> {
    visit: &'f mut dyn FnMut(&mut Value),
}

impl ValueSlots<'_> {
    fn slot(&mut self, value: Option<&mut Value>) {
        if let Some(value) = value.filter(|v| v.is_string()) {
            (self.visit)(value);
        }
    }

    /// An argument object: `{simple: ..}` or `{complex: {filters, transformers}}`.
    fn input(&mut self, input: Option<&mut Value>, is_context: bool) {
        let Some(input) = input.and_then(Value::as_object_mut) else {
            return;
        };
        if is_context {
            return;
        }
        if input.contains_key("simple") {
            self.slot(input.get_mut("simple"));
        } else if let Some(complex) = input.get_mut("complex").and_then(Value::as_object_mut) {
            for group in each_mut(complex.get_mut("filters")) {
                for operation in each_mut(Some(group)) {
                    self.operands(operation);
                }
            }
            for transformer in each_mut(complex.get_mut("transformers")) {
                for argument in each_mut(transformer.get_mut("args")) {
                    self.operand(argument);
                }
            }
        }
    }

    /// `{value: <input>, iscontext: bool}`.
    fn operand(&mut self, operand: &mut Value) {
        let is_context = operand
            .get("iscontext")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        self.input(operand.get_mut("value"), is_context);
    }

    fn operands(&mut self, operation: &mut Value) {
        for side in ["left", "right"] {
            if let Some(operand) = operation.get_mut(side) {
                self.operand(operand);
            }
        }
    }

    fn arguments(&mut self, task: &mut Value) {
        for argument in each_mut(task.get_mut("scriptarguments")) {
            self.input(Some(argument), false);
        }
    }

    fn message(&mut self, task: &mut Value) {
        let Some(message) = task.get_mut("message").and_then(Value::as_object_mut) else {
            return;
        };
        for (key, value) in message.iter_mut() {
            if !key.is_empty() && value.as_object().is_some_and(|o| !o.is_empty()) {
                self.input(Some(value), false);
            }
        }
    }

    fn task(&mut self, task: &mut Value) {
        let kind = task
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match kind.as_str() {
            "condition" => {
                for group in each_mut(task.get_mut("conditions")) {
                    for branch in each_mut(group.get_mut("condition")) {
                        for operation in each_mut(Some(branch)) {
                            self.operands(operation);
                        }
                    }
                }
                self.message(task);
                self.arguments(task);
            }
            "regular" => {
                self.input(task.get_mut("defaultassigneecomplex"), false);
                self.arguments(task);
                for mapping in each_mut(task.get_mut("fieldMapping")) {
                    self.input(mapping.get_mut("output"), false);
                }
            }
            "collection" => {
                self.arguments(task);
                self.message(task);
                let questions = task.get_mut("form").and_then(|f| f.get_mut("questions"));
                for question in each_mut(questions) {
                    self.input(question.get_mut("labelarg"), false);
                }
            }
            _ => {}
        }
        if let Some(inner) = task.get_mut("task") {
            self.slot(inner.get_mut("description"));
            self.slot(inner.get_mut("name"));
        }
    }
}

/// Plain references per task, as (task key, task name, value).
fn misnotated_references(data: &Value) -> Vec<(String, String, String)> {
    let mut found = Vec::new();
    let mut scratch = data.clone();
    for (key, task) in each_mut_entries(scratch.get_mut("tasks")) {
        let name = task
            .pointer("/task/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let mut values = Vec::new();
        ValueSlots {
            visit: &mut |slot: &mut Value| {
                values.extend(slot.as_str().map(plain_references).unwrap_or_default());
            },
        }
        .task(task);
        found.extend(values.into_iter().map(|value| (key.clone(), name.clone(), value)));
    }
    found
}

fn each_mut_entries(value: Option<&mut Value>) -> Vec<(String, &mut Value)> {
    match value {
        Some(Value::Object(map)) => map.iter_mut().map(|(k, v)| (k.clone(), v)).collect(),
        _ => Vec::new(),
    }
}

/// PB121: context paths passed "as value" must use `${}` notation.
pub struct ValueReferencesNotated;

impl Validator for ValueReferencesNotated {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "PB121",
            description: "Validate that all inputs that are intended to be fetched from the context are correctly notated.",
            rationale: "Context paths can be mistakenly used without the correct notation.",
            error_message: "In task: '{0}' with ID: '{1}', an input with the value: '{2}' was passed as a string not a reference. Change the reference to \"From previous tasks\" from \"As value\", or change the value to ${{2}}.",
            fix_message: Some("Fixed the following inputs:\n{0}"),
            related_field: "conditions",
            content_types: ALL_PLAYBOOKS,
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
            .flat_map(|item| {
                misnotated_references(&item.data)
                    .into_iter()
                    .map(|(key, name, value)| self.result(item, &[&name, &key, &value]))
            })
            .collect())
    }

    fn fix(&self, item: &mut Artifact, _ctx: &ValidationContext<'_>) -> Result<FixResult> {
        let mut fixed = Vec::new();
        for (_, task) in each_mut_entries(item.data.get_mut("tasks")) {
            let name = task
                .pointer("/task/name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            ValueSlots {
                visit: &mut |slot: &mut Value| {
                    let Some(text) = slot.as_str() else { return };
                    for value in plain_references(text) {
                        fixed.push(format!("'{}' in task: '{}'", value, name));
                    }
                    let wrapped = wrap_references(text);
                    *slot = Value::String(wrapped);
                },
            }
            .task(task);
        }
        Ok(self.fix_result(item, &[&fixed.join("\n")]))
    }
}
