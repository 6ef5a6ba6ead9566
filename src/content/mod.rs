//! The content model: artifacts, packs, related files and their loader.
//!
//! - [`types`] - closed vocabularies (content types, marketplaces, git statuses)
//! - [`artifact`] - the [`Artifact`] record and its derived attributes
//! - [`related`] - lazily probed auxiliary files
//! - [`pack`] - `pack_metadata.json`
//! - [`loader`] - classification and construction from disk
//! - [`playbook`], [`integration`] - read-only views over typed documents
//! - [`version`], [`version_config`] - version parsing and band rules

pub mod artifact;
pub mod integration;
pub mod loader;
pub mod pack;
pub mod playbook;
pub mod related;
pub mod types;
pub mod version;
pub mod version_config;

pub use artifact::Artifact;
pub use loader::ContentLoader;
pub use pack::{PackMetadata, PackRef};
pub use related::{RelatedContent, RelatedFile};
pub use types::{ContentType, GitStatus, Marketplace, RelatedFileKind, Support};
