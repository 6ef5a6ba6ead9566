//! Script formatting.

use crate::content::Artifact;
use serde_json::Value;

/// Value written to `tests` when a script lists none.
pub const NO_TESTS_MARKER: &str = "No tests (auto formatted)";

/// Fill an absent or empty `tests` list with the no-tests marker.
pub fn update_tests(data: &mut Value) -> bool {
    let Some(object) = data.as_object_mut() else {
        return false;
    };
    let has_tests = match object.get("tests") {
        Some(Value::Array(tests)) => !tests.is_empty(),
        Some(Value::String(test)) => !test.trim().is_empty(),
        _ => false,
    };
    if has_tests {
        return false;
    }
    object.insert("tests".into(), Value::Array(vec![Value::from(NO_TESTS_MARKER)]));
    true
}

/// Script-specific steps of the format pipeline.
pub fn format_script(item: &mut Artifact) -> Vec<&'static str> {
    let mut applied = Vec::new();
    if update_tests(&mut item.data) {
        applied.push("marked script as having no tests");
    }
    applied
}
