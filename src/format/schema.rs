//! Embedded content schemas and schema-driven key pruning.
//!
//! Schemas are kwalify-style YAML documents compiled into the binary from
//! `schemas/`. A node is a `map` (with `mapping`), a `seq` (with one
//! `sequence` entry) or a scalar. Mapping keys of the form `regex;<pattern>`
//! match every data key the pattern matches in full; a map with
//! `allowempty: true` accepts any key.

use crate::content::ContentType;
use crate::error::{PacklintError, Result};
use anyhow::Context;
use include_dir::{include_dir, Dir};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

static SCHEMAS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/schemas");

const REGEX_KEY_PREFIX: &str = "regex;";

/// Raw schema node as written in the YAML files.
#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(default)]
    mapping: Option<BTreeMap<String, RawNode>>,
    #[serde(default)]
    sequence: Option<Vec<RawNode>>,
    #[serde(default)]
    allowempty: bool,
}

/// A compiled schema node.
#[derive(Debug, Default)]
pub struct Schema {
    exact: BTreeMap<String, Schema>,
    patterns: Vec<(Regex, Schema)>,
    item: Option<Box<Schema>>,
    /// Whether this node restricts the keys of a mapping.
    closed: bool,
}

impl Schema {
    /// Parse schema YAML text.
    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawNode = serde_yaml::from_str(text).context("Invalid schema document")?;
        Self::compile(raw)
    }

    fn compile(raw: RawNode) -> Result<Self> {
        let mut schema = Schema {
            closed: raw.mapping.is_some() && !raw.allowempty,
            ..Default::default()
        };
        for (key, child) in raw.mapping.unwrap_or_default() {
            let child = Self::compile(child)?;
            match key.strip_prefix(REGEX_KEY_PREFIX) {
                Some(pattern) => {
                    let regex = Regex::new(&format!("^(?:{})$", pattern))
                        .with_context(|| format!("Invalid schema key pattern '{}'", pattern))?;
                    schema.patterns.push((regex, child));
                }
                None => {
                    schema.exact.insert(key, child);
                }
            }
        }
        if let Some(item) = raw.sequence.and_then(|items| items.into_iter().next()) {
            schema.item = Some(Box::new(Self::compile(item)?));
        }
        Ok(schema)
    }

    /// Schema entry for a data key: exact match first, then patterns in order.
    fn child(&self, key: &str) -> Option<&Schema> {
        self.exact.get(key).or_else(|| {
            self.patterns
                .iter()
                .find(|(regex, _)| regex.is_match(key))
                .map(|(_, schema)| schema)
        })
    }

    /// Remove every key of `data` the schema does not allow, recursively.
    ///
    /// Returns the JSON pointers of the removed keys.
    pub fn remove_unnecessary_keys(&self, data: &mut Value) -> Vec<String> {
        let mut removed = Vec::new();
        self.prune(data, "", &mut removed);
        removed
    }

    fn prune(&self, data: &mut Value, pointer: &str, removed: &mut Vec<String>) {
        match data {
            Value::Object(object) => {
                if self.closed {
                    let unknown: Vec<String> = object
                        .keys()
                        .filter(|key| self.child(key).is_none())
                        .cloned()
                        .collect();
                    for key in unknown {
                        object.shift_remove(&key);
                        removed.push(format!("{}/{}", pointer, key));
                    }
                }
                for (key, value) in object.iter_mut() {
                    if let Some(child) = self.child(key) {
                        child.prune(value, &format!("{}/{}", pointer, key), removed);
                    }
                }
            }
            Value::Array(list) => {
                if let Some(item) = &self.item {
                    for (index, value) in list.iter_mut().enumerate() {
                        item.prune(value, &format!("{}/{}", pointer, index), removed);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Embedded schema file for a content type.
fn schema_file(content_type: ContentType) -> Option<&'static str> {
    Some(match content_type {
        ContentType::Integration => "integration.yml",
        ContentType::Script => "script.yml",
        ContentType::Playbook | ContentType::TestPlaybook => "playbook.yml",
        ContentType::IncidentField => "incidentfield.yml",
        ContentType::IndicatorField => "indicatorfield.yml",
        ContentType::List => "list.yml",
        _ => return None,
    })
}

/// The compiled schema of `content_type`, if one is embedded.
pub fn schema_for(content_type: ContentType) -> Result<Option<Schema>> {
    let Some(name) = schema_file(content_type) else {
        return Ok(None);
    };
    let text = SCHEMAS_DIR
        .get_file(name)
        .and_then(|file| file.contents_utf8())
        .ok_or_else(|| PacklintError::ConfigNotFound {
            path: format!("schemas/{}", name).into(),
        })?;
    Schema::parse(text)
        .map(Some)
        .map_err(|e| PacklintError::ConfigParseError {
            path: format!("schemas/{}", name).into(),
            message: e.to_string(),
        })
}
