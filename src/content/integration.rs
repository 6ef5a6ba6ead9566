//! Accessors over integration and script documents.
//!
//! Integrations nest their code settings under `script:` while scripts keep
//! them at the top level; these helpers hide that difference.

use crate::content::artifact::Artifact;
use crate::content::types::ContentType;
use serde_json::Value;

fn code_section(item: &Artifact) -> Option<&Value> {
    match item.content_type {
        ContentType::Integration => item.data.get("script"),
        ContentType::Script => Some(&item.data),
        _ => None,
    }
}

fn code_section_str<'a>(item: &'a Artifact, key: &str) -> Option<&'a str> {
    code_section(item)?.get(key).and_then(Value::as_str)
}

/// `python`, `powershell` or `javascript`.
pub fn script_type(item: &Artifact) -> Option<&str> {
    code_section_str(item, "type")
}

pub fn is_powershell(item: &Artifact) -> bool {
    script_type(item) == Some("powershell")
}

pub fn subtype(item: &Artifact) -> Option<&str> {
    code_section_str(item, "subtype")
}

pub fn docker_image(item: &Artifact) -> Option<&str> {
    code_section_str(item, "dockerimage")
}

pub fn is_feed(item: &Artifact) -> bool {
    item.content_type == ContentType::Integration
        && item
            .data
            .pointer("/script/feed")
            .and_then(Value::as_bool)
            .unwrap_or(false)
}

pub fn is_fetch(item: &Artifact) -> bool {
    item.content_type == ContentType::Integration
        && item
            .data
            .pointer("/script/isfetch")
            .and_then(Value::as_bool)
            .unwrap_or(false)
}

/// Command definitions of an integration.
pub fn commands(item: &Artifact) -> Vec<&Value> {
    if item.content_type != ContentType::Integration {
        return Vec::new();
    }
    item.data
        .pointer("/script/commands")
        .and_then(Value::as_array)
        .map(|list| list.iter().collect())
        .unwrap_or_default()
}

pub fn command_name(command: &Value) -> &str {
    command
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

pub fn command_names(item: &Artifact) -> Vec<String> {
    commands(item)
        .into_iter()
        .map(command_name)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

/// Context paths declared in an `outputs:` list.
pub fn output_paths(outputs: Option<&Value>) -> Vec<String> {
    outputs
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|o| o.get("contextPath").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Every (command, context path) pair the item declares.
///
/// Scripts report their own name as the command.
pub fn all_outputs(item: &Artifact) -> Vec<(String, String)> {
    match item.content_type {
        ContentType::Integration => commands(item)
            .into_iter()
            .flat_map(|cmd| {
                let name = command_name(cmd).to_string();
                output_paths(cmd.get("outputs"))
                    .into_iter()
                    .map(move |path| (name.clone(), path))
            })
            .collect(),
        ContentType::Script => output_paths(item.data.get("outputs"))
            .into_iter()
            .map(|path| (item.name(), path))
            .collect(),
        _ => Vec::new(),
    }
}

/// Integration configuration parameters.
pub fn params(item: &Artifact) -> Vec<&Value> {
    item.data
        .get("configuration")
        .and_then(Value::as_array)
        .map(|list| list.iter().collect())
        .unwrap_or_default()
}

pub fn param_name(param: &Value) -> &str {
    param
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

/// `hidden` may be a bool or a list of marketplaces.
pub fn param_is_hidden(param: &Value) -> bool {
    match param.get("hidden") {
        Some(Value::Bool(hidden)) => *hidden,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::artifact::test_support::artifact;
    use serde_json::json;

    fn integration() -> Artifact {
        artifact(
            ContentType::Integration,
            "Integrations/Foo/Foo.yml",
            json!({
                "commonfields": {"id": "Foo"},
                "configuration": [
                    {"name": "url", "hidden": false},
                    {"name": "longRunning", "hidden": true},
                    {"name": "token", "hidden": ["xsoar"]}
                ],
                "script": {
                    "type": "python",
                    "subtype": "python3",
                    "feed": true,
                    "dockerimage": "demisto/python3:3.10.1.1",
                    "commands": [
                        {"name": "ip", "outputs": [{"contextPath": "IP.Address"}]},
                        {"name": "url", "outputs": []}
                    ]
                }
            }),
        )
    }

    #[test]
    fn reads_nested_script_settings() {
        let item = integration();
        assert_eq!(script_type(&item), Some("python"));
        assert_eq!(subtype(&item), Some("python3"));
        assert_eq!(docker_image(&item), Some("demisto/python3:3.10.1.1"));
        assert!(is_feed(&item));
        assert!(!is_fetch(&item));
    }

    #[test]
    fn lists_commands_and_outputs() {
        let item = integration();
        assert_eq!(command_names(&item), vec!["ip", "url"]);
        assert_eq!(
            all_outputs(&item),
            vec![("ip".to_string(), "IP.Address".to_string())]
        );
    }

    #[test]
    fn script_settings_are_top_level() {
        let script = artifact(
            ContentType::Script,
            "Scripts/S/S.yml",
            json!({"name": "S", "type": "powershell",
                   "outputs": [{"contextPath": "S.Out"}]}),
        );
        assert!(is_powershell(&script));
        assert_eq!(
            all_outputs(&script),
            vec![("S".to_string(), "S.Out".to_string())]
        );
    }

    #[test]
    fn hidden_only_counts_booleans() {
        let item = integration();
        let hidden: Vec<_> = params(&item)
            .into_iter()
            .filter(|p| param_is_hidden(p))
            .map(param_name)
            .collect();
        assert_eq!(hidden, vec!["longRunning"]);
    }
}
