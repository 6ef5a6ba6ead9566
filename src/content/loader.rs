//! Classification and loading of content files.
//!
//! Each content type declares one or more matchers. A matcher has a
//! precedence tier (directory beats filename suffix beats document keys)
//! and a predicate over the path and the parsed document. The loader keeps
//! the highest tier that matched; more than one distinct type at that tier
//! is an ambiguity error.

use crate::codec::{self, DocumentFormat};
use crate::content::artifact::Artifact;
use crate::content::pack::{PackMetadata, PackRef};
use crate::content::types::{ContentType, RelatedFileKind};
use crate::error::{PacklintError, Result};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

/// Name of the directory that holds packs.
pub const PACKS_DIR: &str = "Packs";

/// Name of the pack metadata file.
pub const PACK_METADATA: &str = "pack_metadata.json";

/// Matcher tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Keys,
    Suffix,
    Directory,
}

struct Matcher {
    content_type: ContentType,
    precedence: Precedence,
    matches: fn(&Path, &Value) -> bool,
}

fn in_dir(path: &Path, dir: &str) -> bool {
    path.parent()
        .map(|parent| parent.components().any(|c| c.as_os_str() == dir))
        .unwrap_or(false)
}

fn ext_is(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

fn is_document(path: &Path) -> bool {
    ext_is(path, "yml") || ext_is(path, "json")
}

fn is_mapper_doc(data: &Value) -> bool {
    matches!(
        data.get("type").and_then(Value::as_str),
        Some("mapping-incoming" | "mapping-outgoing")
    )
}

macro_rules! dir_matcher {
    ($ct:expr, $dir:literal) => {
        Matcher {
            content_type: $ct,
            precedence: Precedence::Directory,
            matches: |path, _| is_document(path) && in_dir(path, $dir),
        }
    };
}

macro_rules! prefix_matcher {
    ($ct:expr, $prefix:literal) => {
        Matcher {
            content_type: $ct,
            precedence: Precedence::Suffix,
            matches: |path, _| is_document(path) && file_name(path).starts_with($prefix),
        }
    };
}

static MATCHERS: &[Matcher] = &[
    dir_matcher!(ContentType::Integration, "Integrations"),
    dir_matcher!(ContentType::Script, "Scripts"),
    dir_matcher!(ContentType::Playbook, "Playbooks"),
    dir_matcher!(ContentType::TestPlaybook, "TestPlaybooks"),
    Matcher {
        content_type: ContentType::Classifier,
        precedence: Precedence::Directory,
        matches: |path, data| is_document(path) && in_dir(path, "Classifiers") && !is_mapper_doc(data),
    },
    Matcher {
        content_type: ContentType::Mapper,
        precedence: Precedence::Directory,
        matches: |path, data| is_document(path) && in_dir(path, "Classifiers") && is_mapper_doc(data),
    },
    dir_matcher!(ContentType::Dashboard, "Dashboards"),
    dir_matcher!(ContentType::IncidentField, "IncidentFields"),
    dir_matcher!(ContentType::IncidentType, "IncidentTypes"),
    dir_matcher!(ContentType::IndicatorField, "IndicatorFields"),
    dir_matcher!(ContentType::IndicatorType, "IndicatorTypes"),
    dir_matcher!(ContentType::Layout, "Layouts"),
    dir_matcher!(ContentType::ParsingRule, "ParsingRules"),
    dir_matcher!(ContentType::ModelingRule, "ModelingRules"),
    dir_matcher!(ContentType::CorrelationRule, "CorrelationRules"),
    dir_matcher!(ContentType::XDRCTemplate, "XDRCTemplates"),
    dir_matcher!(ContentType::GenericField, "GenericFields"),
    dir_matcher!(ContentType::GenericType, "GenericTypes"),
    dir_matcher!(ContentType::GenericModule, "GenericModules"),
    dir_matcher!(ContentType::GenericDefinition, "GenericDefinitions"),
    dir_matcher!(ContentType::Trigger, "Triggers"),
    dir_matcher!(ContentType::Widget, "Widgets"),
    dir_matcher!(ContentType::Wizard, "Wizards"),
    dir_matcher!(ContentType::Job, "Jobs"),
    dir_matcher!(ContentType::List, "Lists"),
    dir_matcher!(ContentType::Report, "Reports"),
    dir_matcher!(ContentType::AgentixAgent, "AgentixAgents"),
    dir_matcher!(ContentType::AgentixAction, "AgentixActions"),
    Matcher {
        content_type: ContentType::ReleaseNote,
        precedence: Precedence::Directory,
        matches: |path, _| ext_is(path, "md") && in_dir(path, "ReleaseNotes"),
    },
    Matcher {
        content_type: ContentType::Pack,
        precedence: Precedence::Suffix,
        matches: |path, _| file_name(path) == PACK_METADATA,
    },
    prefix_matcher!(ContentType::Playbook, "playbook-"),
    prefix_matcher!(ContentType::IncidentField, "incidentfield-"),
    prefix_matcher!(ContentType::IndicatorField, "indicatorfield-"),
    prefix_matcher!(ContentType::IncidentType, "incidenttype-"),
    prefix_matcher!(ContentType::IndicatorType, "reputation-"),
    prefix_matcher!(ContentType::Layout, "layoutscontainer-"),
    prefix_matcher!(ContentType::Mapper, "classifier-mapper-"),
    Matcher {
        content_type: ContentType::Classifier,
        precedence: Precedence::Suffix,
        matches: |path, _| {
            let name = file_name(path);
            is_document(path) && name.starts_with("classifier-") && !name.starts_with("classifier-mapper-")
        },
    },
    prefix_matcher!(ContentType::Dashboard, "dashboard-"),
    prefix_matcher!(ContentType::Widget, "widget-"),
    prefix_matcher!(ContentType::Report, "report-"),
    Matcher {
        content_type: ContentType::AgentixAgent,
        precedence: Precedence::Keys,
        matches: |path, data| ext_is(path, "yml") && data.get("color").is_some(),
    },
    Matcher {
        content_type: ContentType::Playbook,
        precedence: Precedence::Keys,
        matches: |path, data| {
            ext_is(path, "yml") && data.get("tasks").is_some() && data.get("starttaskid").is_some()
        },
    },
    Matcher {
        content_type: ContentType::Integration,
        precedence: Precedence::Keys,
        matches: |path, data| {
            ext_is(path, "yml")
                && data.get("script").is_some_and(Value::is_object)
                && data.get("configuration").is_some()
        },
    },
    Matcher {
        content_type: ContentType::Script,
        precedence: Precedence::Keys,
        matches: |path, data| {
            ext_is(path, "yml")
                && data.get("commonfields").is_some()
                && data.get("script").is_some_and(Value::is_string)
        },
    },
];

/// Decide the content type of a parsed document.
pub fn classify(path: &Path, data: &Value) -> Result<ContentType> {
    let mut best: Option<Precedence> = None;
    let mut candidates: BTreeSet<ContentType> = BTreeSet::new();

    for matcher in MATCHERS {
        if !(matcher.matches)(path, data) {
            continue;
        }
        match best {
            Some(current) if matcher.precedence < current => continue,
            Some(current) if matcher.precedence == current => {
                candidates.insert(matcher.content_type);
            }
            _ => {
                best = Some(matcher.precedence);
                candidates.clear();
                candidates.insert(matcher.content_type);
            }
        }
    }

    let mut iter = candidates.iter();
    match (iter.next(), iter.next()) {
        (None, _) => Err(PacklintError::UnclassifiedFile {
            path: path.to_path_buf(),
        }),
        (Some(content_type), None) => Ok(*content_type),
        (Some(_), Some(_)) => Err(PacklintError::AmbiguousFile {
            path: path.to_path_buf(),
            candidates: candidates
                .iter()
                .map(ContentType::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// The pack directory containing `path`, if any.
pub fn pack_dir(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .find(|ancestor| {
            ancestor
                .parent()
                .and_then(Path::file_name)
                .is_some_and(|name| name == PACKS_DIR)
        })
        .map(Path::to_path_buf)
}

const SKIPPED_DIRS: &[&str] = &["doc_files", "doc_imgs", "test_data", "TestData", "node_modules"];

/// Whether `path` is a primary content file rather than a related or stray file.
pub fn is_primary_candidate(path: &Path) -> bool {
    let name = file_name(path);
    if name.starts_with('.') || path.components().any(|c| SKIPPED_DIRS.iter().any(|d| c.as_os_str() == *d)) {
        return false;
    }
    if in_dir(path, "ReleaseNotes") {
        return ext_is(path, "md");
    }
    if name == PACK_METADATA {
        return true;
    }
    if ext_is(path, "json") {
        let excluded = name == "version_config.json"
            || name.ends_with("_schema.json")
            || name.ends_with("_testdata.json")
            || in_dir(path, "Integrations")
            || in_dir(path, "Scripts");
        return !excluded;
    }
    ext_is(path, "yml")
}

/// Map a related file to the primary file that owns it.
pub fn owner_of(path: &Path) -> Option<(PathBuf, RelatedFileKind)> {
    let name = file_name(path);
    let dir = path.parent()?;

    if let Some(pack) = pack_dir(path) {
        if dir == pack {
            let kind = match name {
                "README.md" => RelatedFileKind::Readme,
                ".pack-ignore" => RelatedFileKind::PackIgnore,
                ".secrets-ignore" => RelatedFileKind::SecretsIgnore,
                "Author_image.png" => RelatedFileKind::AuthorImage,
                "version_config.json" => RelatedFileKind::VersionConfig,
                _ => return None,
            };
            return Some((pack.join(PACK_METADATA), kind));
        }
    }

    let suffixes: &[(&str, RelatedFileKind)] = &[
        ("_description.md", RelatedFileKind::Description),
        ("_image.png", RelatedFileKind::Image),
        ("_dark.svg", RelatedFileKind::DarkSvg),
        ("_light.svg", RelatedFileKind::LightSvg),
        ("_test.py", RelatedFileKind::TestCode),
        (".Tests.ps1", RelatedFileKind::TestCode),
        ("_testdata.json", RelatedFileKind::TestCode),
        ("_schema.json", RelatedFileKind::Schema),
        ("_README.md", RelatedFileKind::Readme),
        ("_system_instructions.md", RelatedFileKind::SystemInstructions),
        ("_test_use_case.md", RelatedFileKind::TestUseCase),
        (".xif", RelatedFileKind::Xif),
        (".py", RelatedFileKind::Code),
        (".ps1", RelatedFileKind::Code),
        (".js", RelatedFileKind::Code),
    ];
    for (suffix, kind) in suffixes {
        if let Some(stem) = name.strip_suffix(suffix) {
            let owner = dir.join(format!("{}.yml", stem));
            if owner.is_file() {
                return Some((owner, *kind));
            }
        }
    }

    if name == "README.md" {
        let dir_name = dir.file_name()?.to_string_lossy();
        let owner = dir.join(format!("{}.yml", dir_name));
        if owner.is_file() {
            return Some((owner, RelatedFileKind::Readme));
        }
    }
    None
}

/// Loads artifacts, caching pack metadata per pack directory.
#[derive(Debug, Default)]
pub struct ContentLoader {
    packs: HashMap<PathBuf, Arc<PackMetadata>>,
}

impl ContentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back-reference for the pack containing `path`.
    pub fn pack_for(&mut self, path: &Path) -> Option<PackRef> {
        let dir = pack_dir(path)?;
        let metadata = self
            .packs
            .entry(dir.clone())
            .or_insert_with(|| {
                let metadata_path = dir.join(PACK_METADATA);
                let metadata = codec::load(&metadata_path)
                    .map(|(value, _)| PackMetadata::from_value(&value))
                    .unwrap_or_else(|err| {
                        debug!("No usable metadata at {}: {}", metadata_path.display(), err);
                        PackMetadata::default()
                    });
                Arc::new(metadata)
            })
            .clone();
        Some(PackRef {
            name: dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: dir,
            metadata,
        })
    }

    /// Classify and load the file at `path` from the working tree.
    pub fn load(&mut self, path: &Path) -> Result<Artifact> {
        let format = DocumentFormat::from_path(path).ok_or_else(|| PacklintError::UnclassifiedFile {
            path: path.to_path_buf(),
        })?;
        let text = std::fs::read_to_string(path)?;
        self.load_from_text(path, &text, format)
    }

    /// Classify and build an artifact from already-read text.
    pub fn load_from_text(&mut self, path: &Path, text: &str, format: DocumentFormat) -> Result<Artifact> {
        let data = codec::parse(text, format, path)?;
        let content_type = classify(path, &data)?;
        let pack = self.pack_for(path);
        Ok(Artifact::new(path.to_path_buf(), content_type, format, data, pack))
    }

    /// Every primary content file under `root`, sorted.
    pub fn discover(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.') || entry.file_type().is_file()
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| pack_dir(path).is_some() && is_primary_candidate(path))
            .collect();
        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn directory_beats_keys() {
        let data = json!({"tasks": {}, "starttaskid": "0"});
        let ct = classify(Path::new("/c/Packs/P/TestPlaybooks/x.yml"), &data).unwrap();
        assert_eq!(ct, ContentType::TestPlaybook);
    }

    #[test]
    fn suffix_beats_keys() {
        let data = json!({"tasks": {}, "starttaskid": "0", "color": "red"});
        let ct = classify(Path::new("/tmp/playbook-x.yml"), &data).unwrap();
        assert_eq!(ct, ContentType::Playbook);
    }

    #[test]
    fn agentix_agent_matches_on_color_key() {
        let ct = classify(Path::new("/tmp/agent.yml"), &json!({"color": "#fff"})).unwrap();
        assert_eq!(ct, ContentType::AgentixAgent);
    }

    #[test]
    fn mapper_and_classifier_share_a_directory() {
        let path = Path::new("/c/Packs/P/Classifiers/c.json");
        assert_eq!(
            classify(path, &json!({"type": "mapping-incoming"})).unwrap(),
            ContentType::Mapper
        );
        assert_eq!(
            classify(path, &json!({"type": "classification"})).unwrap(),
            ContentType::Classifier
        );
    }

    #[test]
    fn unmatched_file_is_unclassified() {
        let err = classify(Path::new("/tmp/random.yml"), &json!({"a": 1})).unwrap_err();
        assert!(matches!(err, PacklintError::UnclassifiedFile { .. }));
    }

    #[test]
    fn conflicting_keys_are_ambiguous() {
        let data = json!({"color": "x", "tasks": {}, "starttaskid": "0"});
        let err = classify(Path::new("/tmp/thing.yml"), &data).unwrap_err();
        assert!(matches!(err, PacklintError::AmbiguousFile { .. }));
    }

    #[test]
    fn release_notes_and_pack_metadata() {
        assert_eq!(
            classify(Path::new("/c/Packs/P/ReleaseNotes/1_0_1.md"), &Value::Null).unwrap(),
            ContentType::ReleaseNote
        );
        assert_eq!(
            classify(Path::new("/c/Packs/P/pack_metadata.json"), &json!({})).unwrap(),
            ContentType::Pack
        );
    }

    #[test]
    fn pack_dir_finds_pack_root() {
        assert_eq!(
            pack_dir(Path::new("/c/Packs/P/Integrations/I/I.yml")),
            Some(PathBuf::from("/c/Packs/P"))
        );
        assert_eq!(pack_dir(Path::new("/c/other/x.yml")), None);
    }

    #[test]
    fn primary_candidates_exclude_related_files() {
        assert!(is_primary_candidate(Path::new("/c/Packs/P/Integrations/I/I.yml")));
        assert!(!is_primary_candidate(Path::new("/c/Packs/P/Integrations/I/I.py")));
        assert!(!is_primary_candidate(Path::new("/c/Packs/P/Integrations/I/test_data/x.json")));
        assert!(!is_primary_candidate(Path::new("/c/Packs/P/ReleaseNotes/1_0_1.json")));
        assert!(is_primary_candidate(Path::new("/c/Packs/P/ReleaseNotes/1_0_1.md")));
        assert!(!is_primary_candidate(Path::new("/c/Packs/P/version_config.json")));
        assert!(is_primary_candidate(Path::new("/c/Packs/P/IncidentFields/f.json")));
    }

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn owner_of_maps_related_files() {
        let temp = TempDir::new().unwrap();
        let yml = write(temp.path(), "Packs/P/Integrations/I/I.yml", "commonfields: {id: I}\n");
        let readme = write(temp.path(), "Packs/P/Integrations/I/README.md", "# I\n");
        let desc = write(temp.path(), "Packs/P/Integrations/I/I_description.md", "d");
        let pack_readme = write(temp.path(), "Packs/P/README.md", "");

        assert_eq!(owner_of(&readme), Some((yml.clone(), RelatedFileKind::Readme)));
        assert_eq!(owner_of(&desc), Some((yml, RelatedFileKind::Description)));
        assert_eq!(
            owner_of(&pack_readme),
            Some((temp.path().join("Packs/P/pack_metadata.json"), RelatedFileKind::Readme))
        );
    }

    #[test]
    fn loads_artifact_with_pack_metadata() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Packs/P/pack_metadata.json", r#"{"name": "P", "support": "partner"}"#);
        let path = write(
            temp.path(),
            "Packs/P/Scripts/S/S.yml",
            "commonfields:\n  id: S\nname: S\nscript: ''\ntype: python\n",
        );

        let mut loader = ContentLoader::new();
        let item = loader.load(&path).unwrap();
        assert_eq!(item.content_type, ContentType::Script);
        assert_eq!(item.object_id(), "S");
        assert_eq!(item.pack_name(), Some("P"));
        assert_eq!(item.support(), crate::content::types::Support::Partner);
    }

    #[test]
    fn discover_lists_primary_files_only() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Packs/P/pack_metadata.json", "{}");
        write(temp.path(), "Packs/P/Scripts/S/S.yml", "name: S\n");
        write(temp.path(), "Packs/P/Scripts/S/S.py", "");
        write(temp.path(), "Packs/P/.pack-ignore", "");
        write(temp.path(), "stray.yml", "a: 1\n");

        let files = ContentLoader::new().discover(temp.path());
        let rel: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(temp.path()).unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(rel, vec!["Packs/P/Scripts/S/S.yml", "Packs/P/pack_metadata.json"]);
    }
}
