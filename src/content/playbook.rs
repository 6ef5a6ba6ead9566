//! Read-only views over playbook task structures.

use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::LazyLock;

/// Label of the fallback branch of a condition task.
pub const DEFAULT_BRANCH: &str = "#default#";

static INPUT_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"inputs\.([A-Za-z0-9_\-]+)").expect("valid regex"));

/// A single task entry of `tasks:`.
#[derive(Debug, Clone, Copy)]
pub struct Task<'a> {
    key: &'a str,
    value: &'a Value,
}

impl<'a> Task<'a> {
    /// Key under `tasks:`; the id other tasks refer to.
    pub fn key(&self) -> &'a str {
        self.key
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn id(&self) -> &'a str {
        self.value
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or(self.key)
    }

    pub fn taskid(&self) -> Option<&'a str> {
        self.value.get("taskid").and_then(Value::as_str)
    }

    /// `task.id`, the inner identifier.
    pub fn inner_id(&self) -> Option<&'a str> {
        self.value.pointer("/task/id").and_then(Value::as_str)
    }

    pub fn task_type(&self) -> &'a str {
        self.value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn is_title(&self) -> bool {
        self.task_type() == "title"
    }

    pub fn is_start(&self) -> bool {
        self.task_type() == "start"
    }

    pub fn is_condition(&self) -> bool {
        self.task_type() == "condition"
    }

    fn inner_str(&self, key: &str) -> Option<&'a str> {
        self.value
            .get("task")
            .and_then(|t| t.get(key))
            .and_then(Value::as_str)
    }

    pub fn name(&self) -> &'a str {
        self.inner_str("name").unwrap_or_default()
    }

    pub fn description(&self) -> Option<&'a str> {
        self.inner_str("description")
    }

    pub fn script_name(&self) -> Option<&'a str> {
        self.inner_str("scriptName")
            .or_else(|| self.inner_str("script"))
            .filter(|s| !s.is_empty())
    }

    pub fn playbook_name(&self) -> Option<&'a str> {
        self.inner_str("playbookName").filter(|s| !s.is_empty())
    }

    pub fn playbook_id(&self) -> Option<&'a str> {
        self.inner_str("playbookId").filter(|s| !s.is_empty())
    }

    pub fn quietmode(&self) -> Option<i64> {
        self.value.get("quietmode").and_then(Value::as_i64)
    }

    pub fn display_label(&self) -> Option<&'a str> {
        self.value.get("displayLabel").and_then(Value::as_str)
    }

    pub fn script_arguments(&self) -> Option<&'a serde_json::Map<String, Value>> {
        self.value.get("scriptarguments").and_then(Value::as_object)
    }

    /// Simple string value of a script argument.
    pub fn argument(&self, name: &str) -> Option<&'a str> {
        let arg = self.script_arguments()?.get(name)?;
        arg.get("simple")
            .and_then(Value::as_str)
            .or_else(|| arg.as_str())
    }

    /// Branch label to next task keys, in document order.
    pub fn next_tasks(&self) -> Vec<(&'a str, Vec<&'a str>)> {
        self.value
            .get("nexttasks")
            .and_then(Value::as_object)
            .map(|branches| {
                branches
                    .iter()
                    .map(|(label, targets)| {
                        let targets = targets
                            .as_array()
                            .map(|list| list.iter().filter_map(Value::as_str).collect())
                            .unwrap_or_default();
                        (label.as_str(), targets)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Labels declared by `conditions:` entries.
    pub fn condition_labels(&self) -> Vec<&'a str> {
        self.value
            .get("conditions")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|c| c.get("label").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Reply options of an ask task's `message`.
    pub fn reply_options(&self) -> Vec<&'a str> {
        self.value
            .pointer("/message/replyOptions")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Tasks in document order.
pub fn tasks(data: &Value) -> Vec<Task<'_>> {
    data.get("tasks")
        .and_then(Value::as_object)
        .map(|tasks| {
            tasks
                .iter()
                .map(|(key, value)| Task { key, value })
                .collect()
        })
        .unwrap_or_default()
}

/// Find a task by its key.
pub fn task<'a>(data: &'a Value, key: &str) -> Option<Task<'a>> {
    let (key, value) = data.get("tasks")?.as_object()?.get_key_value(key)?;
    Some(Task { key, value })
}

pub fn start_task_id(data: &Value) -> Option<&str> {
    data.get("starttaskid").and_then(Value::as_str)
}

/// Task keys in breadth-first order from `starttaskid`.
pub fn bfs_order(data: &Value) -> Vec<String> {
    let Some(start) = start_task_id(data) else {
        return Vec::new();
    };
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([start.to_string()]);

    while let Some(key) = queue.pop_front() {
        if !visited.insert(key.clone()) {
            continue;
        }
        let Some(current) = task(data, &key) else {
            continue;
        };
        order.push(key);
        for (_, targets) in current.next_tasks() {
            for target in targets {
                if !visited.contains(target) {
                    queue.push_back(target.to_string());
                }
            }
        }
    }
    order
}

/// Keys of every task some other task points to.
pub fn referenced_task_keys(data: &Value) -> BTreeSet<String> {
    tasks(data)
        .iter()
        .flat_map(|t| t.next_tasks())
        .flat_map(|(_, targets)| targets)
        .map(str::to_string)
        .collect()
}

/// Names of declared playbook inputs.
pub fn declared_inputs(data: &Value) -> Vec<String> {
    data.get("inputs")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|input| input.get("key").and_then(Value::as_str))
                .filter(|key| !key.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Input names referenced as `inputs.<name>` anywhere in the tasks or outputs.
pub fn referenced_inputs(data: &Value) -> BTreeSet<String> {
    let mut text = data
        .get("tasks")
        .map(Value::to_string)
        .unwrap_or_default();
    if let Some(outputs) = data.get("outputs") {
        text.push_str(&outputs.to_string());
    }
    INPUT_REFERENCE
        .captures_iter(&text)
        .map(|c| c[1].trim_end_matches('.').to_string())
        .collect()
}

/// Every script, command and sub-playbook the playbook calls, with the field declaring it.
pub fn task_references(data: &Value) -> Vec<TaskReference> {
    let mut refs = Vec::new();
    for t in tasks(data) {
        if let Some(script) = t.script_name() {
            let (kind, name) = match script.split_once('|') {
                Some((_, command)) => (ReferenceKind::Command, command.trim_start_matches('|')),
                None => (ReferenceKind::Script, script),
            };
            refs.push(TaskReference {
                task_key: t.key().to_string(),
                kind,
                target: name.to_string(),
                field: "task.scriptName",
            });
        }
        if t.task_type() == "playbook" {
            if let Some(target) = t.playbook_id().or_else(|| t.playbook_name()) {
                refs.push(TaskReference {
                    task_key: t.key().to_string(),
                    kind: ReferenceKind::Playbook,
                    target: target.to_string(),
                    field: if t.playbook_id().is_some() {
                        "task.playbookId"
                    } else {
                        "task.playbookName"
                    },
                });
            }
        }
    }
    refs
}

/// What a task reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Script,
    Command,
    Playbook,
}

/// A symbolic reference from a task to another item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReference {
    pub task_key: String,
    pub kind: ReferenceKind,
    pub target: String,
    pub field: &'static str,
}
