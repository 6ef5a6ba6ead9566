//! The artifact model.
//!
//! Every content item is one [`Artifact`]: its path, its content type, the
//! raw parsed document and its related files. Identity and the common
//! attributes are derived from the document according to the content type,
//! so callers never branch on type to read them.

use crate::codec::DocumentFormat;
use crate::content::pack::{PackMetadata, PackRef, PLATFORM_MODULES};
use crate::content::related::{related_candidates, ReadSource, RelatedFile};
use crate::content::types::{ContentType, GitStatus, Marketplace, RelatedFileKind, Support};
use crate::content::version::{to_file_stem, DEFAULT_FROM_VERSION, DEFAULT_TO_VERSION};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A single loaded piece of content.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Absolute path of the primary file (`pack_metadata.json` for packs).
    pub path: PathBuf,
    pub content_type: ContentType,
    pub format: DocumentFormat,
    /// Raw parsed document.
    pub data: Value,
    /// Status relative to the git base ref, when known.
    pub git_status: Option<GitStatus>,
    /// Path before a rename.
    pub old_path: Option<PathBuf>,
    /// The same artifact as it appears on the base ref.
    pub old_base: Option<Box<Artifact>>,
    pub pack: Option<PackRef>,
    pub related: BTreeMap<RelatedFileKind, RelatedFile>,
}

impl Artifact {
    /// Create an artifact and attach its related-file descriptors.
    pub fn new(
        path: PathBuf,
        content_type: ContentType,
        format: DocumentFormat,
        data: Value,
        pack: Option<PackRef>,
    ) -> Self {
        let mut artifact = Self {
            path,
            content_type,
            format,
            data,
            git_status: None,
            old_path: None,
            old_base: None,
            pack,
            related: BTreeMap::new(),
        };
        artifact.attach_related(ReadSource::WorkingTree);
        artifact
    }

    /// Rebuild related-file descriptors reading from `source`.
    pub fn attach_related(&mut self, source: ReadSource) {
        let release_note_stem = match (&self.content_type, &self.pack) {
            (ContentType::Pack, Some(pack)) => pack.metadata.current_version().map(|v| to_file_stem(&v)),
            _ => None,
        };
        self.related = related_candidates(self.content_type, &self.path, release_note_stem.as_deref())
            .into_iter()
            .map(|(kind, candidates)| {
                (kind, RelatedFile::new(kind, candidates).with_source(source.clone()))
            })
            .collect();
    }

    /// Related file of `kind`, if this content type has one.
    pub fn related_file(&self, kind: RelatedFileKind) -> Option<&RelatedFile> {
        self.related.get(&kind)
    }

    /// Top-level string field.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// First present string among alternative spellings of a key.
    fn str_field_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.str_field(key))
    }

    /// Logical identity inside the content type.
    pub fn object_id(&self) -> String {
        match self.content_type {
            ContentType::Integration | ContentType::Script => self
                .data
                .pointer("/commonfields/id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default(),
            ContentType::Pack => self
                .path
                .parent()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ContentType::ReleaseNote => self
                .path
                .file_stem()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ContentType::Layout => self
                .str_field_any(&["id", "typeId"])
                .unwrap_or_default()
                .to_string(),
            _ => match self.data.get("id") {
                Some(Value::String(id)) => id.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            },
        }
    }

    /// Name as declared in the document.
    pub fn name(&self) -> String {
        match self.content_type {
            ContentType::Pack => self
                .pack
                .as_ref()
                .map(|p| p.metadata.name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| self.object_id()),
            ContentType::ReleaseNote => self.object_id(),
            ContentType::Layout => self
                .str_field_any(&["name", "TypeName"])
                .unwrap_or_default()
                .to_string(),
            _ => self.str_field("name").unwrap_or_default().to_string(),
        }
    }

    /// User-facing name.
    pub fn display_name(&self) -> String {
        match self.content_type {
            ContentType::Integration => self
                .str_field("display")
                .map(str::to_string)
                .unwrap_or_else(|| self.name()),
            ContentType::Trigger => self
                .str_field("trigger_name")
                .map(str::to_string)
                .unwrap_or_else(|| self.name()),
            _ => self.name(),
        }
    }

    /// Declared `fromversion`, or `0.0.0`.
    pub fn fromversion(&self) -> String {
        self.declared_fromversion()
            .unwrap_or(DEFAULT_FROM_VERSION)
            .to_string()
    }

    /// Declared `fromversion` without the default.
    pub fn declared_fromversion(&self) -> Option<&str> {
        self.str_field_any(&["fromversion", "fromVersion"])
    }

    /// Key under which this document stores its fromversion.
    pub fn fromversion_key(&self) -> &'static str {
        if self.data.get("fromVersion").is_some() || self.format == DocumentFormat::Json {
            "fromVersion"
        } else {
            "fromversion"
        }
    }

    /// Declared `toversion`, or `99.99.99`.
    pub fn toversion(&self) -> String {
        self.str_field_any(&["toversion", "toVersion"])
            .unwrap_or(DEFAULT_TO_VERSION)
            .to_string()
    }

    /// Target marketplaces: the item's own list, else its pack's, else the defaults.
    pub fn marketplaces(&self) -> Vec<Marketplace> {
        let declared: Vec<Marketplace> = self
            .data
            .get("marketplaces")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .filter_map(Marketplace::parse)
                    .collect()
            })
            .unwrap_or_default();
        if !declared.is_empty() {
            return declared;
        }
        match &self.pack {
            Some(pack) => pack.metadata.marketplaces(),
            None => Marketplace::DEFAULT.to_vec(),
        }
    }

    /// The item's own `supportedModules`, when it lists any.
    pub fn declared_modules(&self) -> Option<Vec<String>> {
        let modules: Vec<String> = match self.content_type {
            ContentType::Pack => self.pack_metadata()?.supported_modules.clone()?,
            _ => self
                .data
                .get("supportedModules")?
                .as_array()?
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        };
        (!modules.is_empty()).then_some(modules)
    }

    /// Modules the item runs in: its own list, else its pack's, else every platform module.
    pub fn supported_modules(&self) -> Vec<String> {
        if let Some(modules) = self.declared_modules() {
            return modules;
        }
        match self.pack_metadata() {
            Some(metadata) => metadata.supported_modules(),
            None => PLATFORM_MODULES.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn deprecated(&self) -> bool {
        match self.content_type {
            ContentType::Pack => self.pack_metadata().is_some_and(|m| m.deprecated),
            _ => self
                .data
                .get("deprecated")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }

    pub fn is_silent(&self) -> bool {
        ["issilent", "isSilent", "is_silent"]
            .iter()
            .any(|key| self.data.get(*key).and_then(Value::as_bool).unwrap_or(false))
    }

    /// Support tier of the owning pack.
    pub fn support(&self) -> Support {
        self.pack_metadata()
            .map(PackMetadata::support)
            .unwrap_or_default()
    }

    pub fn pack_metadata(&self) -> Option<&PackMetadata> {
        self.pack.as_ref().map(|p| p.metadata.as_ref())
    }

    pub fn pack_name(&self) -> Option<&str> {
        self.pack.as_ref().map(|p| p.name.as_str())
    }

    pub fn is_new(&self) -> bool {
        self.git_status == Some(GitStatus::Added)
    }

    /// Path relative to `root`, with forward slashes.
    pub fn relative_path(&self, root: &Path) -> String {
        self.path
            .strip_prefix(root)
            .unwrap_or(&self.path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Markdown text of a release-note artifact.
    pub fn text(&self) -> &str {
        self.data.as_str().unwrap_or_default()
    }
}
