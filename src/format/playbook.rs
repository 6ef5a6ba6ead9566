//! Playbook formatting.

use crate::content::Artifact;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Task types that get an empty description when they have none.
const DESCRIBED_TASK_TYPES: &[&str] = &["title", "start", "playbook"];

fn tasks_mut(data: &mut Value) -> impl Iterator<Item = &mut Map<String, Value>> {
    data.get_mut("tasks")
        .and_then(Value::as_object_mut)
        .into_iter()
        .flat_map(|tasks| tasks.values_mut())
        .filter_map(Value::as_object_mut)
}

fn is_uuid(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|v| Uuid::parse_str(v).is_ok())
}

/// Give tasks whose `taskid` or `task.id` is not a UUID one fresh UUID for both.
pub fn reconcile_task_uuids(data: &mut Value) -> bool {
    let mut changed = false;
    for task in tasks_mut(data) {
        let inner_ok = is_uuid(task.get("task").and_then(|t| t.get("id")));
        if is_uuid(task.get("taskid")) && inner_ok {
            continue;
        }
        let id = Uuid::new_v4().to_string();
        task.insert("taskid".into(), Value::String(id.clone()));
        if let Some(inner) = task.get_mut("task").and_then(Value::as_object_mut) {
            inner.insert("id".into(), Value::String(id));
        }
        changed = true;
    }
    changed
}

/// Add `task.description: ""` to title, start and sub-playbook tasks lacking one.
pub fn add_task_descriptions(data: &mut Value) -> bool {
    let mut changed = false;
    for task in tasks_mut(data) {
        let typed = task
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| DESCRIBED_TASK_TYPES.contains(&t));
        let Some(inner) = task.get_mut("task").and_then(Value::as_object_mut) else {
            continue;
        };
        let described = inner
            .get("description")
            .and_then(Value::as_str)
            .is_some_and(|d| !d.is_empty());
        if typed && !described && inner.get("description") != Some(&Value::String(String::new())) {
            inner.insert("description".into(), Value::String(String::new()));
            changed = true;
        }
    }
    changed
}

/// Set each sub-playbook task's name to the playbook it runs.
pub fn mirror_sub_playbook_names(data: &mut Value) -> bool {
    let mut changed = false;
    for task in tasks_mut(data) {
        if task.get("type").and_then(Value::as_str) != Some("playbook") {
            continue;
        }
        let Some(inner) = task.get_mut("task").and_then(Value::as_object_mut) else {
            continue;
        };
        let target = inner
            .get("playbookName")
            .or_else(|| inner.get("playbookId"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        if let Some(target) = target {
            if inner.get("name").and_then(Value::as_str) != Some(target.as_str()) {
                inner.insert("name".into(), Value::String(target));
                changed = true;
            }
        }
    }
    changed
}

/// Strip `_copy`/`_dev` from sub-playbook references.
pub fn strip_sub_playbook_suffixes(data: &mut Value) -> bool {
    let mut changed = false;
    for task in tasks_mut(data) {
        let Some(inner) = task.get_mut("task").and_then(Value::as_object_mut) else {
            continue;
        };
        if inner.get("playbookName").and_then(Value::as_str).is_none() {
            continue;
        }
        for key in ["playbookName", "name"] {
            if let Some(Value::String(value)) = inner.get_mut(key) {
                let stripped = value.replace("_dev", "").replace("_copy", "");
                if stripped != *value {
                    *value = stripped;
                    changed = true;
                }
            }
        }
    }
    changed
}

/// Remove the top-level `sourceplaybookid`.
pub fn delete_source_playbook_id(data: &mut Value) -> bool {
    data.as_object_mut()
        .is_some_and(|object| object.shift_remove("sourceplaybookid").is_some())
}

/// Playbook-specific steps of the format pipeline.
pub fn format_playbook(item: &mut Artifact) -> Vec<&'static str> {
    let mut applied = Vec::new();
    let data = &mut item.data;
    if delete_source_playbook_id(data) {
        applied.push("removed sourceplaybookid");
    }
    if strip_sub_playbook_suffixes(data) {
        applied.push("removed _copy/_dev from sub-playbook references");
    }
    if mirror_sub_playbook_names(data) {
        applied.push("named sub-playbook tasks after their playbooks");
    }
    if add_task_descriptions(data) {
        applied.push("added empty task descriptions");
    }
    if reconcile_task_uuids(data) {
        applied.push("regenerated task UUIDs");
    }
    applied
}
