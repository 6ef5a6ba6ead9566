//! Integration formatting.
//!
//! Normalizes the `configuration` parameters and the reputation command
//! arguments of an integration, and adds the parameters that fetching and
//! feed integrations must declare.

use crate::content::integration::{is_feed, is_fetch};
use crate::content::{Artifact, Marketplace};
use serde_json::{json, Map, Value};

/// Checkbox parameter type.
const BOOLEAN_PARAM_TYPE: i64 = 8;

/// Commands whose main argument is the command name itself.
pub const REPUTATION_COMMANDS: &[&str] = &["file", "email", "domain", "url", "ip", "cve", "endpoint"];

/// Canonical display names of the connection parameters.
const CONNECTION_PARAMS: &[(&str, &str)] = &[
    ("insecure", "Trust any certificate (not secure)"),
    ("unsecure", "Trust any certificate (not secure)"),
    ("proxy", "Use system proxy settings"),
];

fn fetch_params(kind: &str) -> [Value; 2] {
    [
        json!({"display": format!("{} type", kind), "name": "incidentType", "required": false, "type": 13}),
        json!({"display": format!("Fetch {}s", kind.to_lowercase()), "name": "isFetch", "required": false, "type": 8}),
    ]
}

fn feed_params() -> Vec<Value> {
    vec![
        json!({"name": "feed", "defaultvalue": "true", "display": "Fetch indicators", "type": 8, "required": false}),
        json!({
            "name": "feedReputation",
            "display": "Indicator Reputation",
            "type": 18,
            "required": false,
            "options": ["None", "Good", "Suspicious", "Bad"],
            "additionalinfo": "Indicators from this integration instance will be marked with this reputation"
        }),
        json!({
            "name": "feedReliability",
            "display": "Source Reliability",
            "type": 15,
            "required": true,
            "options": [
                "A - Completely reliable",
                "B - Usually reliable",
                "C - Fairly reliable",
                "D - Not usually reliable",
                "E - Unreliable",
                "F - Reliability cannot be judged"
            ],
            "additionalinfo": "Reliability of the source providing the intelligence data"
        }),
        json!({
            "name": "feedExpirationPolicy",
            "display": "",
            "type": 17,
            "required": false,
            "options": ["never", "interval", "indicatorType", "suddenDeath"]
        }),
        json!({"name": "feedExpirationInterval", "display": "", "type": 1, "required": false}),
        json!({"name": "feedFetchInterval", "display": "Feed Fetch Interval", "type": 19, "required": false}),
        json!({
            "name": "feedBypassExclusionList",
            "display": "Bypass exclusion list",
            "type": 8,
            "required": false,
            "additionalinfo": "When selected, the exclusion list is ignored for indicators from this feed. This means that if an indicator from this feed is on the exclusion list, the indicator might still be added to the system."
        }),
        json!({"name": "feedTags", "display": "Tags", "required": false, "type": 0, "additionalinfo": "Supports CSV values."}),
        json!({
            "name": "tlp_color",
            "display": "Traffic Light Protocol Color",
            "options": ["RED", "AMBER", "GREEN", "WHITE"],
            "required": false,
            "type": 15,
            "additionalinfo": "The Traffic Light Protocol (TLP) designation to apply to indicators fetched from the feed"
        }),
    ]
}

fn configuration_mut(data: &mut Value) -> Option<&mut Vec<Value>> {
    data.get_mut("configuration").and_then(Value::as_array_mut)
}

fn str_of<'a>(param: &'a Value, key: &str) -> &'a str {
    param.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Give `insecure`/`unsecure`/`proxy` their canonical display, checkbox type and `required: false`.
pub fn set_connection_param_defaults(data: &mut Value) -> bool {
    let mut changed = false;
    for param in configuration_mut(data).into_iter().flatten() {
        let Some((_, display)) = CONNECTION_PARAMS
            .iter()
            .find(|(name, _)| *name == str_of(param, "name"))
        else {
            continue;
        };
        let Some(object) = param.as_object_mut() else {
            continue;
        };
        for (key, value) in [
            ("display", Value::from(*display)),
            ("type", Value::from(BOOLEAN_PARAM_TYPE)),
            ("required", Value::Bool(false)),
        ] {
            if object.get(key) != Some(&value) {
                object.insert(key.to_string(), value);
                changed = true;
            }
        }
    }
    changed
}

/// Make the argument named after a reputation command its default, array and required argument.
///
/// Commands that already have a default argument are left alone.
pub fn set_reputation_argument_defaults(data: &mut Value) -> bool {
    let mut changed = false;
    let Some(commands) = data.pointer_mut("/script/commands").and_then(Value::as_array_mut) else {
        return false;
    };
    for command in commands {
        let name = str_of(command, "name").to_string();
        if !REPUTATION_COMMANDS.contains(&name.as_str()) {
            continue;
        }
        let Some(arguments) = command.get_mut("arguments").and_then(Value::as_array_mut) else {
            continue;
        };
        if arguments
            .iter()
            .any(|a| a.get("default").and_then(Value::as_bool).unwrap_or(false))
        {
            continue;
        }
        let Some(object) = arguments
            .iter_mut()
            .find(|a| str_of(a, "name") == name)
            .and_then(Value::as_object_mut)
        else {
            continue;
        };
        for key in ["default", "isArray", "required"] {
            object.insert(key.to_string(), Value::Bool(true));
        }
        changed = true;
    }
    changed
}

fn same_param(a: &Value, b: &Value) -> bool {
    str_of(a, "name") == str_of(b, "name") && str_of(a, "display") == str_of(b, "display")
}

/// Add the incident (or alert) fetch parameters to fetching integrations.
///
/// Items that ship to XSOAR, or name no marketplace, use the incident
/// wording; others use the alert wording and drop the incident one.
pub fn set_fetch_params(item: &mut Artifact) -> bool {
    if !is_fetch(item) {
        return false;
    }
    let marketplaces = item.data.get("marketplaces").map(|_| item.marketplaces()).unwrap_or_default();
    let xsoar = marketplaces.is_empty() || marketplaces.contains(&Marketplace::Xsoar);
    let (wanted, unwanted) = if xsoar {
        (fetch_params("Incident"), fetch_params("Alert"))
    } else {
        (fetch_params("Alert"), fetch_params("Incident"))
    };

    let Some(object) = item.data.as_object_mut() else {
        return false;
    };
    let configuration = object
        .entry("configuration")
        .or_insert_with(|| Value::Array(Vec::new()));
    let Some(params) = configuration.as_array_mut() else {
        return false;
    };

    let before = params.clone();
    params.retain(|p| !unwanted.iter().any(|u| same_param(p, u)));
    for param in wanted {
        if !params.iter().any(|p| same_param(p, &param)) {
            params.push(param);
        }
    }
    *params != before
}

/// Add every required feed parameter a feed integration lacks, by name.
pub fn set_feed_params(item: &mut Artifact) -> bool {
    if !is_feed(item) {
        return false;
    }
    let Some(object) = item.data.as_object_mut() else {
        return false;
    };
    let Some(params) = object
        .entry("configuration")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
    else {
        return false;
    };
    let mut changed = false;
    for required in feed_params() {
        if !params.iter().any(|p| str_of(p, "name") == str_of(&required, "name")) {
            params.push(required);
            changed = true;
        }
    }
    changed
}

/// Lowercase `True`/`FALSE` style defaults of checkbox parameters.
pub fn lowercase_checkbox_defaults(data: &mut Value) -> bool {
    let mut changed = false;
    for param in configuration_mut(data).into_iter().flatten() {
        if param.get("type").and_then(Value::as_i64) != Some(BOOLEAN_PARAM_TYPE) {
            continue;
        }
        let Some(object) = param.as_object_mut() else {
            continue;
        };
        let normalized = match object.get("defaultvalue") {
            Some(Value::String(s)) if s == "true" || s == "false" => continue,
            Some(Value::String(s)) => s.to_ascii_lowercase(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => continue,
        };
        if normalized == "true" || normalized == "false" {
            object.insert("defaultvalue".into(), Value::String(normalized));
            changed = true;
        }
    }
    changed
}

/// Restore marketplace-valued `hidden` flags that an edit turned into booleans.
pub fn restore_hidden_marketplace_params(item: &mut Artifact) -> bool {
    let Some(old) = item.old_base.as_ref() else {
        return false;
    };
    let old_hidden: Map<String, Value> = old
        .data
        .get("configuration")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|p| Some((str_of(p, "name").to_string(), p.get("hidden")?.clone())))
        .filter(|(_, hidden)| !hidden.is_boolean())
        .collect();
    if old_hidden.is_empty() {
        return false;
    }

    let mut changed = false;
    for param in configuration_mut(&mut item.data).into_iter().flatten() {
        let Some(previous) = old_hidden.get(str_of(param, "name")) else {
            continue;
        };
        let Some(object) = param.as_object_mut() else {
            continue;
        };
        let cleared = match object.get("hidden") {
            None => true,
            Some(Value::Bool(hidden)) => !hidden,
            Some(_) => false,
        };
        if cleared {
            object.insert("hidden".into(), previous.clone());
            changed = true;
        }
    }
    changed
}

/// Integration-specific steps of the format pipeline.
pub fn format_integration(item: &mut Artifact) -> Vec<&'static str> {
    let mut applied = Vec::new();
    if restore_hidden_marketplace_params(item) {
        applied.push("restored marketplace hidden flags");
    }
    if set_connection_param_defaults(&mut item.data) {
        applied.push("normalized proxy/insecure parameters");
    }
    if set_reputation_argument_defaults(&mut item.data) {
        applied.push("set reputation command default arguments");
    }
    if set_fetch_params(item) {
        applied.push("added fetch parameters");
    }
    if set_feed_params(item) {
        applied.push("added feed parameters");
    }
    if lowercase_checkbox_defaults(&mut item.data) {
        applied.push("lowercased checkbox defaults");
    }
    applied
}
