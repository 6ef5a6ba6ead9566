//! Pack metadata (`pack_metadata.json`).

use crate::content::types::{Marketplace, Support};
use crate::content::version::parse_strict;
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// The recognized keys of `pack_metadata.json`.
///
/// Unknown keys are ignored and missing keys fall back to their defaults so
/// that a partially written metadata file still loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackMetadata {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub support: String,

    #[serde(default = "default_current_version")]
    pub current_version: String,

    #[serde(default)]
    pub marketplaces: Vec<String>,

    #[serde(default)]
    pub managed: bool,

    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub item_prefix: Option<ItemPrefix>,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default)]
    pub deprecated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_modules: Option<Vec<String>>,
}

/// Platform modules an item may declare under `supportedModules`.
pub const PLATFORM_MODULES: &[&str] = &["C1", "C3", "X0", "X1", "X3", "X5", "ENT_PLUS"];

fn default_current_version() -> String {
    "1.0.0".to_string()
}

/// `itemPrefix` may be a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemPrefix {
    One(String),
    Many(Vec<String>),
}

impl PackMetadata {
    /// Build metadata from an already-parsed document, tolerating bad values.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|err| {
            tracing::debug!("Falling back to lenient pack metadata parse: {}", err);
            Self {
                name: str_key(value, "name"),
                description: str_key(value, "description"),
                support: str_key(value, "support"),
                current_version: value
                    .get("currentVersion")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(default_current_version),
                managed: value.get("managed").and_then(Value::as_bool).unwrap_or(false),
                source: value.get("source").and_then(Value::as_str).map(str::to_string),
                ..Self::default()
            }
        })
    }

    /// Support tier, defaulting to xsoar for unknown values.
    pub fn support(&self) -> Support {
        Support::parse(&self.support).unwrap_or_default()
    }

    /// A pack is autonomous when it is managed and sourced autonomously.
    pub fn is_autonomous(&self) -> bool {
        self.managed && self.source.as_deref() == Some("autonomous")
    }

    /// Declared marketplaces, or the defaults when none are listed.
    pub fn marketplaces(&self) -> Vec<Marketplace> {
        let parsed: Vec<Marketplace> = self
            .marketplaces
            .iter()
            .filter_map(|m| Marketplace::parse(m))
            .collect();
        if parsed.is_empty() {
            Marketplace::DEFAULT.to_vec()
        } else {
            parsed
        }
    }

    /// Declared modules, or every platform module when none are listed.
    pub fn supported_modules(&self) -> Vec<String> {
        match &self.supported_modules {
            Some(modules) if !modules.is_empty() => modules.clone(),
            _ => PLATFORM_MODULES.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Item prefixes, flattened.
    pub fn item_prefixes(&self) -> Vec<String> {
        match &self.item_prefix {
            Some(ItemPrefix::One(prefix)) => vec![prefix.clone()],
            Some(ItemPrefix::Many(prefixes)) => prefixes.clone(),
            None => Vec::new(),
        }
    }

    /// `currentVersion` as a strict semantic version.
    pub fn current_version(&self) -> Option<Version> {
        parse_strict(&self.current_version)
    }
}

fn str_key(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Back-reference from an artifact to its pack.
#[derive(Debug, Clone, PartialEq)]
pub struct PackRef {
    /// Pack directory name.
    pub name: String,
    /// Pack directory.
    pub path: PathBuf,
    pub metadata: Arc<PackMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_recognized_keys() {
        let meta = PackMetadata::from_value(&json!({
            "name": "Auto",
            "support": "partner",
            "currentVersion": "2.1.0",
            "marketplaces": ["xsoar", "marketplacev2"],
            "managed": true,
            "source": "autonomous",
            "itemPrefix": ["Auto", "AU"],
        }));

        assert_eq!(meta.name, "Auto");
        assert_eq!(meta.support(), Support::Partner);
        assert_eq!(meta.current_version(), Some(Version::new(2, 1, 0)));
        assert!(meta.is_autonomous());
        assert_eq!(meta.item_prefixes(), vec!["Auto", "AU"]);
    }

    #[test]
    fn managed_without_autonomous_source_is_not_autonomous() {
        let meta = PackMetadata::from_value(&json!({"managed": true, "source": "other"}));
        assert!(!meta.is_autonomous());
    }

    #[test]
    fn defaults_apply_when_missing() {
        let meta = PackMetadata::from_value(&json!({}));
        assert_eq!(meta.current_version, "1.0.0");
        assert_eq!(meta.support(), Support::Xsoar);
        assert_eq!(meta.marketplaces(), Marketplace::DEFAULT.to_vec());
        assert!(meta.item_prefixes().is_empty());
    }

    #[test]
    fn single_item_prefix() {
        let meta = PackMetadata::from_value(&json!({"itemPrefix": "Silent"}));
        assert_eq!(meta.item_prefixes(), vec!["Silent"]);
    }

    #[test]
    fn tolerates_wrong_types() {
        let meta = PackMetadata::from_value(&json!({"name": "X", "managed": "yes"}));
        assert_eq!(meta.name, "X");
        assert!(!meta.managed);
    }
}
