//! Auxiliary files that travel with an artifact.
//!
//! A [`RelatedFile`] knows a list of candidate paths. The first candidate that
//! exists is the selected path; when none exist the last candidate is the
//! canonical expected location, which is what error messages cite.
//!
//! Existence and content are probed lazily and cached. Read failures are
//! logged at debug level and surface as empty content, so validators must
//! tolerate empty input.

use crate::content::types::{ContentType, RelatedEncoding, RelatedFileKind};
use crate::error::Result;
use crate::git::GitProvider;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Where related-file reads are served from.
#[derive(Debug, Clone, Default)]
pub enum ReadSource {
    #[default]
    WorkingTree,
    GitRef {
        provider: Arc<dyn GitProvider>,
        git_ref: String,
    },
}

impl ReadSource {
    fn read(&self, path: &Path) -> std::result::Result<Vec<u8>, String> {
        match self {
            ReadSource::WorkingTree => std::fs::read(path).map_err(|e| e.to_string()),
            ReadSource::GitRef { provider, git_ref } => {
                provider.read_at(git_ref, path).map_err(|e| e.to_string())
            }
        }
    }

    fn exists(&self, path: &Path) -> bool {
        match self {
            ReadSource::WorkingTree => path.is_file(),
            ReadSource::GitRef { .. } => self.read(path).is_ok(),
        }
    }
}

/// Decoded content of a related file.
#[derive(Debug, Clone, PartialEq)]
pub enum RelatedContent {
    Text(String),
    Json(Option<Value>),
    Binary(Vec<u8>),
}

/// A lazily probed auxiliary file.
#[derive(Debug, Clone)]
pub struct RelatedFile {
    kind: RelatedFileKind,
    candidates: Vec<PathBuf>,
    source: ReadSource,
    /// Set by selection when the file itself appears in the change set.
    pub changed: bool,
    selected: OnceLock<Option<PathBuf>>,
    content: OnceLock<RelatedContent>,
}

impl RelatedFile {
    pub fn new(kind: RelatedFileKind, candidates: Vec<PathBuf>) -> Self {
        Self {
            kind,
            candidates,
            source: ReadSource::WorkingTree,
            changed: false,
            selected: OnceLock::new(),
            content: OnceLock::new(),
        }
    }

    /// Direct reads at a git ref instead of the working tree.
    pub fn with_source(mut self, source: ReadSource) -> Self {
        self.source = source;
        self
    }

    pub fn kind(&self) -> RelatedFileKind {
        self.kind
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    fn selected(&self) -> Option<&PathBuf> {
        self.selected
            .get_or_init(|| {
                self.candidates
                    .iter()
                    .find(|candidate| self.source.exists(candidate))
                    .cloned()
            })
            .as_ref()
    }

    /// True iff at least one candidate exists.
    pub fn exist(&self) -> bool {
        self.selected().is_some()
    }

    /// The selected path, or the canonical expected path when none exists.
    pub fn path(&self) -> PathBuf {
        self.selected()
            .or_else(|| self.candidates.last())
            .cloned()
            .unwrap_or_default()
    }

    /// Cached decoded content of the selected file.
    pub fn file_content(&self) -> &RelatedContent {
        self.content.get_or_init(|| {
            let bytes = match self.selected() {
                Some(path) => match self.source.read(path) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        debug!("Failed to read {}: {}", path.display(), err);
                        Vec::new()
                    }
                },
                None => Vec::new(),
            };
            decode(self.kind.encoding(), bytes, &self.path())
        })
    }

    /// Text content, empty for missing or non-text files.
    pub fn text(&self) -> &str {
        match self.file_content() {
            RelatedContent::Text(text) => text,
            _ => "",
        }
    }

    /// Decoded JSON content, `None` for missing or malformed files.
    pub fn json(&self) -> Option<&Value> {
        match self.file_content() {
            RelatedContent::Json(value) => value.as_ref(),
            _ => None,
        }
    }

    /// Raw bytes of a binary file.
    pub fn bytes(&self) -> &[u8] {
        match self.file_content() {
            RelatedContent::Binary(bytes) => bytes,
            _ => &[],
        }
    }

    /// Write new text or JSON content to the selected path.
    pub fn write(&mut self, content: RelatedContent) -> Result<()> {
        let path = self.path();
        let text = match &content {
            RelatedContent::Text(text) => text.clone(),
            RelatedContent::Json(Some(value)) => {
                crate::codec::dump(value, crate::codec::DocumentFormat::Json)?
            }
            RelatedContent::Json(None) | RelatedContent::Binary(_) => {
                return Err(anyhow::anyhow!(
                    "Cannot write {} content to {}",
                    self.kind,
                    path.display()
                )
                .into());
            }
        };
        std::fs::write(&path, text)?;
        self.selected = OnceLock::from(Some(path));
        self.content = OnceLock::from(content);
        Ok(())
    }
}

fn decode(encoding: RelatedEncoding, bytes: Vec<u8>, path: &Path) -> RelatedContent {
    match encoding {
        RelatedEncoding::Text => RelatedContent::Text(String::from_utf8_lossy(&bytes).into_owned()),
        RelatedEncoding::Binary => RelatedContent::Binary(bytes),
        RelatedEncoding::Json => {
            if bytes.is_empty() {
                return RelatedContent::Json(None);
            }
            match serde_json::from_slice(&bytes) {
                Ok(value) => RelatedContent::Json(Some(value)),
                Err(err) => {
                    debug!("Failed to decode {}: {}", path.display(), err);
                    RelatedContent::Json(None)
                }
            }
        }
    }
}

/// Candidate paths for every related file an artifact of `content_type` has.
///
/// `path` is the artifact's own file (for packs, `pack_metadata.json`).
pub fn related_candidates(
    content_type: ContentType,
    path: &Path,
    release_note_stem: Option<&str>,
) -> Vec<(RelatedFileKind, Vec<PathBuf>)> {
    use RelatedFileKind as K;

    if content_type == ContentType::Pack {
        let path = path.parent().unwrap_or_else(|| Path::new(""));
        let mut related = vec![
            (K::Readme, vec![path.join("README.md")]),
            (K::PackIgnore, vec![path.join(".pack-ignore")]),
            (K::SecretsIgnore, vec![path.join(".secrets-ignore")]),
            (K::AuthorImage, vec![path.join("Author_image.png")]),
            (K::VersionConfig, vec![path.join("version_config.json")]),
        ];
        if let Some(stem) = release_note_stem {
            related.push((
                K::ReleaseNote,
                vec![path.join("ReleaseNotes").join(format!("{}.md", stem))],
            ));
        }
        return related;
    }

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sibling = |suffix: &str| dir.join(format!("{}{}", stem, suffix));

    match content_type {
        ContentType::Integration | ContentType::Script => {
            let mut related = vec![
                (K::Readme, vec![dir.join("README.md")]),
                (
                    K::Code,
                    vec![sibling(".ps1"), sibling(".js"), sibling(".py")],
                ),
                (
                    K::TestCode,
                    vec![sibling(".Tests.ps1"), sibling("_test.py")],
                ),
            ];
            if content_type == ContentType::Integration {
                related.push((K::Description, vec![sibling("_description.md")]));
                related.push((K::Image, vec![sibling("_image.png")]));
                related.push((K::DarkSvg, vec![sibling("_dark.svg")]));
                related.push((K::LightSvg, vec![sibling("_light.svg")]));
            }
            related
        }
        ContentType::Playbook | ContentType::TestPlaybook => {
            vec![(K::Readme, vec![sibling("_README.md")])]
        }
        ContentType::ModelingRule | ContentType::ParsingRule => vec![
            (K::Schema, vec![sibling("_schema.json")]),
            (K::Xif, vec![sibling(".xif")]),
            (K::TestCode, vec![sibling("_testdata.json")]),
        ],
        ContentType::AgentixAgent => vec![
            (K::SystemInstructions, vec![sibling("_system_instructions.md")]),
            (K::TestUseCase, vec![sibling("_test_use_case.md")]),
        ],
        ContentType::Dashboard | ContentType::Report | ContentType::Widget => {
            vec![(K::Image, vec![sibling("_image.png")])]
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PacklintError;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct FakeGit;

    impl GitProvider for FakeGit {
        fn changed_files(&self, _base_ref: &str) -> Result<Vec<crate::git::ChangedFile>> {
            Ok(Vec::new())
        }

        fn read_at(&self, git_ref: &str, path: &Path) -> Result<Vec<u8>> {
            if path.ends_with("README.md") {
                Ok(format!("readme at {}", git_ref).into_bytes())
            } else {
                Err(PacklintError::Git {
                    message: "missing".into(),
                })
            }
        }
    }

    #[test]
    fn selects_first_existing_candidate() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.py");
        let b = temp.path().join("b.py");
        std::fs::write(&b, "print()").unwrap();

        let file = RelatedFile::new(RelatedFileKind::Code, vec![a, b.clone()]);
        assert!(file.exist());
        assert_eq!(file.path(), b);
        assert_eq!(file.text(), "print()");
    }

    #[test]
    fn missing_file_points_at_last_candidate() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("x.ps1");
        let last = temp.path().join("x.py");

        let file = RelatedFile::new(RelatedFileKind::Code, vec![first, last.clone()]);
        assert!(!file.exist());
        assert_eq!(file.path(), last);
        assert_eq!(file.text(), "");
    }

    #[test]
    fn content_is_cached_after_first_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("README.md");
        std::fs::write(&path, "one").unwrap();

        let file = RelatedFile::new(RelatedFileKind::Readme, vec![path.clone()]);
        assert_eq!(file.text(), "one");
        std::fs::write(&path, "two").unwrap();
        assert_eq!(file.text(), "one");
    }

    #[test]
    fn malformed_json_is_none() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("version_config.json");
        std::fs::write(&path, "{not json").unwrap();

        let file = RelatedFile::new(RelatedFileKind::VersionConfig, vec![path]);
        assert!(file.exist());
        assert!(file.json().is_none());
    }

    #[test]
    fn write_updates_cache() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("x_description.md");

        let mut file = RelatedFile::new(RelatedFileKind::Description, vec![path.clone()]);
        assert_eq!(file.text(), "");
        file.write(RelatedContent::Text("Hello.".into())).unwrap();

        assert_eq!(file.text(), "Hello.");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Hello.");
    }

    #[test]
    fn binary_write_is_rejected() {
        let temp = TempDir::new().unwrap();
        let mut file =
            RelatedFile::new(RelatedFileKind::Image, vec![temp.path().join("x_image.png")]);
        assert!(file.write(RelatedContent::Binary(vec![1, 2])).is_err());
    }

    #[test]
    fn reads_from_git_ref() {
        let source = ReadSource::GitRef {
            provider: Arc::new(FakeGit),
            git_ref: "origin/master".into(),
        };
        let file = RelatedFile::new(RelatedFileKind::Readme, vec![PathBuf::from("P/README.md")])
            .with_source(source);

        assert!(file.exist());
        assert_eq!(file.text(), "readme at origin/master");
    }

    #[test]
    fn integration_candidates_include_description_and_code() {
        let related = related_candidates(
            ContentType::Integration,
            Path::new("/c/Packs/A/Integrations/Foo/Foo.yml"),
            None,
        );
        let description = related
            .iter()
            .find(|(kind, _)| *kind == RelatedFileKind::Description)
            .unwrap();
        assert_eq!(
            description.1,
            vec![PathBuf::from("/c/Packs/A/Integrations/Foo/Foo_description.md")]
        );
        let code = related
            .iter()
            .find(|(kind, _)| *kind == RelatedFileKind::Code)
            .unwrap();
        assert!(code.1.last().unwrap().ends_with("Foo.py"));
    }

    #[test]
    fn pack_candidates_include_release_note_when_known() {
        let related = related_candidates(
            ContentType::Pack,
            Path::new("/c/Packs/A/pack_metadata.json"),
            Some("1_0_1"),
        );
        assert!(related.iter().any(|(kind, paths)| *kind
            == RelatedFileKind::ReleaseNote
            && paths[0].ends_with("ReleaseNotes/1_0_1.md")));
    }
}
