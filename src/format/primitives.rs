//! Transformations shared by the format commands and validator fixes.
//!
//! Every primitive works on the parsed document in place and is idempotent.
//! None of them lowers a declared `fromversion`.

use crate::content::integration::{is_feed, is_powershell};
use crate::content::version::{is_lower, OLDEST_SUPPORTED_VERSION};
use crate::content::{Artifact, ContentType};
use serde_json::{Map, Value};

const NAME_SUFFIXES: &[&str] = &["_copy", "_dev"];

/// Object holding the `version` marker: `commonfields` for code items.
fn version_holder(item: &mut Artifact) -> Option<&mut Map<String, Value>> {
    let data = if item.content_type.is_code_item() {
        item.data.get_mut("commonfields")?
    } else {
        &mut item.data
    };
    data.as_object_mut()
}

/// The declared `version` marker.
pub fn version_marker(item: &Artifact) -> Option<i64> {
    let pointer = if item.content_type.is_code_item() {
        "/commonfields/version"
    } else {
        "/version"
    };
    item.data.pointer(pointer).and_then(Value::as_i64)
}

/// Set `version: -1`.
pub fn set_version_to_default(item: &mut Artifact) -> bool {
    if version_marker(item) == Some(-1) {
        return false;
    }
    let Some(object) = version_holder(item) else {
        return false;
    };
    object.insert("version".into(), Value::from(-1));
    true
}

/// Default `fromversion` a new item of `content_type` gets.
pub fn default_fromversion(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Wizard | ContentType::Job => "6.8.0",
        ContentType::GenericField
        | ContentType::GenericType
        | ContentType::GenericModule
        | ContentType::GenericDefinition
        | ContentType::List => "6.5.0",
        ContentType::Layout | ContentType::Mapper | ContentType::Classifier => "6.0.0",
        ContentType::ParsingRule | ContentType::CorrelationRule => "6.10.0",
        _ => OLDEST_SUPPORTED_VERSION,
    }
}

/// Lowest `fromversion` an item may declare, given its type and settings.
pub fn minimum_fromversion(item: &Artifact) -> &'static str {
    match item.content_type {
        ContentType::Integration if is_powershell(item) || is_feed(item) => "5.5.0",
        ContentType::Script if is_powershell(item) => "5.5.0",
        ContentType::IndicatorField => match item.str_field("type") {
            Some("html") => "6.1.0",
            Some("grid") => "5.5.0",
            _ => OLDEST_SUPPORTED_VERSION,
        },
        other => default_fromversion(other),
    }
}

/// Raise `fromversion` to `minimum` when it is lower; never lowers it.
pub fn raise_fromversion(item: &mut Artifact, minimum: &str) -> bool {
    if !is_lower(&item.fromversion(), minimum) {
        return false;
    }
    let key = item.fromversion_key();
    let Some(object) = item.data.as_object_mut() else {
        return false;
    };
    object.shift_remove(if key == "fromversion" { "fromVersion" } else { "fromversion" });
    object.insert(key.to_string(), Value::String(minimum.to_string()));
    true
}

/// Apply the format-time fromversion policy.
///
/// An explicit version wins when it does not lower the current one. New
/// items get the type default; existing items keep their value unless a
/// type rule requires raising it.
pub fn set_fromversion(item: &mut Artifact, explicit: Option<&str>) -> bool {
    let mut changed = false;
    if let Some(version) = explicit {
        changed |= raise_fromversion(item, version);
    }
    if item.declared_fromversion().is_none() && item.old_base.is_none() {
        changed |= raise_fromversion(item, default_fromversion(item.content_type));
    }
    changed |= raise_fromversion(item, minimum_fromversion(item));
    changed
}

/// JSON pointer of the identity field for a content type.
pub fn object_id_pointer(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Integration | ContentType::Script => "/commonfields/id",
        _ => "/id",
    }
}

/// Overwrite the identity field.
pub fn set_object_id(item: &mut Artifact, id: &str) -> bool {
    let pointer = object_id_pointer(item.content_type);
    match item.data.pointer_mut(pointer) {
        Some(slot) if slot.as_str() == Some(id) => false,
        Some(slot) => {
            *slot = Value::String(id.to_string());
            true
        }
        None => false,
    }
}

/// Strip trailing `_copy` and `_dev` from `name` and `display`.
pub fn remove_copy_and_dev_suffixes(data: &mut Value) -> bool {
    let mut changed = false;
    for key in ["name", "display"] {
        let Some(Value::String(value)) = data.get_mut(key) else {
            continue;
        };
        let mut stripped = value.as_str();
        while let Some(suffix) = NAME_SUFFIXES.iter().find(|s| stripped.ends_with(*s)) {
            stripped = &stripped[..stripped.len() - suffix.len()];
        }
        if stripped.len() != value.len() {
            *value = stripped.to_string();
            changed = true;
        }
    }
    changed
}

fn trim_end_at(data: &mut Value, pointer: &str) -> bool {
    match data.pointer_mut(pointer) {
        Some(Value::String(value)) if value.trim_end().len() != value.len() => {
            *value = value.trim_end().to_string();
            true
        }
        _ => false,
    }
}

/// Trim trailing whitespace from the id and name; new items only.
pub fn remove_spaces_end_of_id_and_name(item: &mut Artifact) -> bool {
    if item.old_base.is_some() {
        return false;
    }
    trim_id_and_name(item)
}

/// Trim trailing whitespace from the id and name unconditionally.
pub fn trim_id_and_name(item: &mut Artifact) -> bool {
    let id_pointer = object_id_pointer(item.content_type);
    let id = trim_end_at(&mut item.data, id_pointer);
    let name = trim_end_at(&mut item.data, "/name");
    id || name
}

/// Remove the `nativeimage` key (top level for scripts, under `script` for integrations).
pub fn remove_nativeimage(item: &mut Artifact) -> bool {
    let target = match item.content_type {
        ContentType::Integration => item.data.get_mut("script"),
        ContentType::Script => Some(&mut item.data),
        _ => None,
    };
    target
        .and_then(Value::as_object_mut)
        .is_some_and(|object| object.shift_remove("nativeimage").is_some())
}

/// Drop keys whose value is `null`, recursively.
pub fn remove_null_fields(data: &mut Value) -> bool {
    match data {
        Value::Object(object) => {
            let before = object.len();
            object.retain(|_, v| !v.is_null());
            let mut changed = object.len() != before;
            for value in object.values_mut() {
                changed |= remove_null_fields(value);
            }
            changed
        }
        Value::Array(list) => list.iter_mut().fold(false, |acc, v| remove_null_fields(v) | acc),
        _ => false,
    }
}

/// Reorder `data` to follow `base` when the two differ only in key order.
///
/// Substantive edits are kept as they are.
pub fn sync_data_to_master(data: &mut Value, base: &Value) -> bool {
    if data != base || same_order(data, base) {
        return false;
    }
    *data = base.clone();
    true
}

fn same_order(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => {
            a.keys().eq(b.keys()) && a.values().zip(b.values()).all(|(x, y)| same_order(x, y))
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_order(x, y))
        }
        _ => true,
    }
}

/// Insert `key: value` when the key is missing.
pub fn insert_missing(object: &mut Map<String, Value>, key: &str, value: Value) -> bool {
    if object.contains_key(key) {
        return false;
    }
    object.insert(key.to_string(), value);
    true
}
