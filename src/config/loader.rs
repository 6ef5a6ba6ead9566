//! Configuration discovery and loading.
//!
//! The project config lives at `<content root>/.packlint.yml` and may be
//! layered with `.packlint.local.yml`. A missing project config is not an
//! error: defaults apply.

use crate::config::merger::merge_configs;
use crate::config::schema::PacklintConfig;
use crate::error::{PacklintError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project config file name.
pub const CONFIG_FILE: &str = ".packlint.yml";

/// Uncommitted local overrides.
pub const LOCAL_CONFIG_FILE: &str = ".packlint.local.yml";

/// Config files of a content root, in merge order.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub project: Option<PathBuf>,
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn discover(content_root: &Path) -> Self {
        let existing = |name: &str| {
            let path = content_root.join(name);
            path.is_file().then_some(path)
        };
        Self {
            project: existing(CONFIG_FILE),
            project_local: existing(LOCAL_CONFIG_FILE),
        }
    }

    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.project.iter().chain(self.project_local.iter()).collect()
    }
}

/// Walk up from `start` to the content root.
///
/// The root is the first directory holding a `.packlint.yml`, a `.git`
/// entry, or a `Packs` directory.
pub fn find_content_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).is_file()
            || current.join(".git").exists()
            || current.join("Packs").is_dir()
        {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PacklintError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PacklintError::Io(e)
        }
    })
}

/// Parse YAML content into a [`PacklintConfig`].
pub fn parse_config(content: &str, source_path: &Path) -> Result<PacklintConfig> {
    if content.trim().is_empty() {
        return Ok(PacklintConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| PacklintError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load exactly one config file.
pub fn load_config_file(path: &Path) -> Result<PacklintConfig> {
    parse_config(&read(path)?, path)
}

/// Load a config file as raw YAML, for merging.
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = read(path)?;
    if content.trim().is_empty() {
        return Ok(serde_yaml::Value::Mapping(Default::default()));
    }
    serde_yaml::from_str(&content).map_err(|e| PacklintError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Merge the project config with its local overrides.
pub fn load_merged_config(content_root: &Path) -> Result<PacklintConfig> {
    let paths = ConfigPaths::discover(content_root);
    let existing = paths.all_existing();
    if existing.is_empty() {
        debug!("No {} under {}; using defaults", CONFIG_FILE, content_root.display());
        return Ok(PacklintConfig::default());
    }

    let layers = existing
        .into_iter()
        .map(|path| load_config_value(path))
        .collect::<Result<Vec<_>>>()?;

    serde_yaml::from_value(merge_configs(&layers)).map_err(|e| PacklintError::ConfigParseError {
        path: content_root.join(CONFIG_FILE),
        message: format!("Failed to parse merged config: {}", e),
    })
}

/// Load `config_override` alone when given, else the merged project config.
pub fn load_config(content_root: &Path, config_override: Option<&Path>) -> Result<PacklintConfig> {
    match config_override {
        Some(path) => load_config_file(path),
        None => load_merged_config(content_root),
    }
}
