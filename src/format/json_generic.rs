//! Formatting shared by JSON content items.

use crate::codec;
use crate::content::version::{is_lower, DEFAULT_TO_VERSION, OLDEST_SUPPORTED_VERSION};
use crate::content::{Artifact, ContentType, Marketplace};
use crate::error::Result;
use crate::format::primitives::{remove_null_fields, sync_data_to_master};
use crate::graph::ContentGraph;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::debug;

/// Steps every JSON item goes through.
pub fn format_json(item: &mut Artifact) -> Vec<&'static str> {
    let mut applied = Vec::new();
    if let Some(base) = item.old_base.as_ref().map(|base| base.data.clone()) {
        if sync_data_to_master(&mut item.data, &base) {
            applied.push("restored key order of the base version");
        }
    }
    if remove_null_fields(&mut item.data) {
        applied.push("removed null fields");
    }
    applied
}

fn alias_cli_names(item: &Artifact) -> Vec<String> {
    item.data
        .get("Aliases")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|alias| alias.get("cliName").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

fn is_xsoar_only(field: &Value) -> bool {
    field.get("marketplaces") == Some(&json!([Marketplace::Xsoar.as_str()]))
}

fn still_supported(field: &Value) -> bool {
    let to_version = ["toVersion", "toversion"]
        .iter()
        .find_map(|key| field.get(*key).and_then(Value::as_str))
        .unwrap_or(DEFAULT_TO_VERSION);
    is_lower(OLDEST_SUPPORTED_VERSION, to_version)
}

/// Restrict the incident fields aliased by `item` to the XSOAR marketplace.
///
/// Alias targets are found in the graph by `cliName` and rewritten on disk.
/// Returns the paths of the files that changed.
pub fn update_alias_marketplaces(item: &Artifact, graph: &ContentGraph) -> Result<Vec<PathBuf>> {
    if item.content_type != ContentType::IncidentField {
        return Ok(Vec::new());
    }
    let mut written = Vec::new();
    for cli_name in alias_cli_names(item) {
        for node in graph.search(ContentType::IncidentField, &[("cliName", json!(cli_name))]) {
            let Some(path) = node.path.as_ref().filter(|p| **p != item.path) else {
                continue;
            };
            let (original, format) = codec::load(path)?;
            if !still_supported(&original) || is_xsoar_only(&original) {
                continue;
            }
            let mut updated = original.clone();
            if let Some(object) = updated.as_object_mut() {
                object.insert("marketplaces".into(), json!([Marketplace::Xsoar.as_str()]));
            }
            if codec::write_if_changed(path, &original, &updated, format)? {
                debug!("Restricted alias field {} to xsoar", path.display());
                written.push(path.clone());
            }
        }
    }
    Ok(written)
}
