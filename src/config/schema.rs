//! Configuration schema for `.packlint.yml`.
//!
//! Every key is optional; a missing file and an empty file both produce
//! [`PacklintConfig::default`].

use crate::error::{PacklintError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of `.packlint.yml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PacklintConfig {
    /// Code filters and support-tier overrides for `validate`.
    pub validate: ValidateConfig,

    /// Content graph settings.
    pub graph: GraphConfig,

    /// Git change detection.
    pub git: GitConfig,

    /// Defaults for `format`.
    pub format: FormatConfig,

    /// Docker registry used by `format --update-docker`.
    pub docker: DockerConfig,
}

/// The `validate:` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ValidateConfig {
    /// Only these codes run when non-empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub select: Vec<String>,

    /// Codes that never run.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,

    /// Codes reported as warnings; they never fail the run.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warning: Vec<String>,

    /// Per support tier (`xsoar`, `partner`, `community`, `developer`) overrides.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub support_level: BTreeMap<String, SupportOverrides>,

    /// Validate deprecated items as well.
    #[serde(skip_serializing_if = "is_false")]
    pub run_on_deprecated: bool,

    /// Accept `## ` as a first-level release note header.
    #[serde(skip_serializing_if = "is_false")]
    pub force_rn_headers: bool,

    /// Ask the docker registry whether images use their latest tag.
    #[serde(skip_serializing_if = "is_false")]
    pub check_docker_tags: bool,
}

/// Overrides for one support tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SupportOverrides {
    /// Codes skipped for items of this tier.
    pub ignore: Vec<String>,
}

/// The `graph:` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GraphConfig {
    /// Packs every other pack may depend on.
    pub core_packs: Vec<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            core_packs: default_core_packs(),
        }
    }
}

/// The `git:` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GitConfig {
    /// Ref that `validate --use-git` diffs against.
    pub base_ref: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            base_ref: default_base_ref(),
        }
    }
}

/// The `format:` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FormatConfig {
    /// Answer yes to every formatter prompt.
    #[serde(skip_serializing_if = "is_false")]
    pub assume_yes: bool,

    /// Bump docker images to their latest tag.
    #[serde(skip_serializing_if = "is_false")]
    pub update_docker: bool,
}

/// The `docker:` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DockerConfig {
    /// Base URL of the registry HTTP API.
    pub registry_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            registry_url: "https://hub.docker.com".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Packs treated as core when no config names them.
pub fn default_core_packs() -> Vec<String> {
    ["Base", "CommonScripts", "CommonPlaybooks"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_base_ref() -> String {
    "origin/master".to_string()
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// JSON schema of `.packlint.yml`, pretty printed.
pub fn config_json_schema() -> Result<String> {
    let schema = schemars::schema_for!(PacklintConfig);
    serde_json::to_string_pretty(&schema).map_err(|e| PacklintError::Other(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: PacklintConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, PacklintConfig::default());
        assert_eq!(config.graph.core_packs, vec!["Base", "CommonScripts", "CommonPlaybooks"]);
        assert_eq!(config.git.base_ref, "origin/master");
        assert_eq!(config.docker.timeout_secs, 10);
    }

    #[test]
    fn parses_validate_section() {
        let yaml = r#"
validate:
  select: [BA101, PB100]
  warning: [RM100]
  support_level:
    community:
      ignore: [BA127]
  run_on_deprecated: true
"#;
        let config: PacklintConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.validate.select, vec!["BA101", "PB100"]);
        assert_eq!(config.validate.warning, vec!["RM100"]);
        assert_eq!(config.validate.support_level["community"].ignore, vec!["BA127"]);
        assert!(config.validate.run_on_deprecated);
        assert!(!config.validate.force_rn_headers);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: PacklintConfig =
            serde_yaml::from_str("docker:\n  timeout_secs: 3\n").unwrap();
        assert_eq!(config.docker.timeout_secs, 3);
        assert_eq!(config.docker.registry_url, "https://hub.docker.com");
    }

    #[test]
    fn schema_names_every_section() {
        let schema = config_json_schema().unwrap();
        for section in ["validate", "graph", "git", "format", "docker"] {
            assert!(schema.contains(&format!("\"{}\"", section)), "{}", section);
        }
    }
}
