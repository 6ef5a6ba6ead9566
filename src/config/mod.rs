//! Project configuration.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Layered merging in [`merger`]
//!
//! # Example
//!
//! ```
//! use packlint::config::load_merged_config;
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! std::fs::write(temp.path().join(".packlint.yml"), "validate:\n  ignore: [BA101]\n").unwrap();
//!
//! let config = load_merged_config(temp.path()).unwrap();
//! assert_eq!(config.validate.ignore, vec!["BA101".to_string()]);
//! ```

pub mod loader;
pub mod merger;
pub mod schema;

pub use loader::{
    find_content_root, load_config, load_config_file, load_config_value, load_merged_config,
    parse_config, ConfigPaths, CONFIG_FILE, LOCAL_CONFIG_FILE,
};
pub use merger::{deep_merge, merge_configs};
pub use schema::{
    config_json_schema, default_core_packs, DockerConfig, FormatConfig, GitConfig, GraphConfig,
    PacklintConfig, SupportOverrides, ValidateConfig,
};
