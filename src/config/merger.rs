//! Layered merge of `.packlint.yml` documents.
//!
//! - Mappings merge key by key, recursively
//! - Sequences from the overlay replace the base sequence
//! - A `null` in the overlay deletes the key
//! - Any other overlay value replaces the base value

use serde_yaml::{Mapping, Value};

/// Merge `overlay` on top of `base`.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    let (Value::Mapping(base_map), Value::Mapping(overlay_map)) = (base, overlay) else {
        return overlay.clone();
    };

    let mut merged: Mapping = base_map.clone();
    for (key, value) in overlay_map {
        if value.is_null() {
            merged.remove(key);
            continue;
        }
        let next = match base_map.get(key) {
            Some(existing) => deep_merge(existing, value),
            None => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    Value::Mapping(merged)
}

/// Fold `layers` in order; the last layer wins.
pub fn merge_configs(layers: &[Value]) -> Value {
    layers
        .iter()
        .fold(Value::Mapping(Mapping::new()), |acc, layer| deep_merge(&acc, layer))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn nested_sections_merge() {
        let base = yaml("validate:\n  ignore: [BA101]\n  run_on_deprecated: true\n");
        let local = yaml("validate:\n  run_on_deprecated: false\n");

        let merged = deep_merge(&base, &local);
        assert_eq!(merged["validate"]["ignore"][0], "BA101");
        assert_eq!(merged["validate"]["run_on_deprecated"], false);
    }

    #[test]
    fn sequences_are_replaced() {
        let base = yaml("graph:\n  core_packs: [Base, CommonScripts]\n");
        let local = yaml("graph:\n  core_packs: [Mine]\n");

        let merged = deep_merge(&base, &local);
        let packs = merged["graph"]["core_packs"].as_sequence().unwrap();
        assert_eq!(packs.len(), 1);
        assert_eq!(packs[0], "Mine");
    }

    #[test]
    fn null_deletes_the_key() {
        let base = yaml("git:\n  base_ref: origin/main\ndocker:\n  timeout_secs: 5\n");
        let local = yaml("git: ~\n");

        let merged = deep_merge(&base, &local);
        assert!(merged.get("git").is_none());
        assert_eq!(merged["docker"]["timeout_secs"], 5);
    }

    #[test]
    fn layers_fold_in_order() {
        let merged = merge_configs(&[
            yaml("format:\n  assume_yes: false\n"),
            yaml("format:\n  assume_yes: true\n"),
            yaml("format:\n  update_docker: true\n"),
        ]);
        assert_eq!(merged["format"]["assume_yes"], true);
        assert_eq!(merged["format"]["update_docker"], true);
    }

    #[test]
    fn no_layers_is_an_empty_mapping() {
        assert_eq!(merge_configs(&[]), Value::Mapping(Mapping::new()));
    }
}
