//! `.pack-ignore` files.
//!
//! The format is INI-like:
//!
//! ```text
//! [file:MyIntegration.yml]
//! ignore=BA101,RM104
//!
//! [known_words]
//! foo
//! ```
//!
//! Only `[file:NAME]` sections are meaningful here. A section applies to an
//! item whose path ends with `NAME`. Unknown codes are kept and simply never
//! match anything.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parsed ignore rules of one pack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackIgnore {
    files: BTreeMap<PathBuf, BTreeSet<String>>,
}

impl PackIgnore {
    /// Load from disk; a missing or unreadable file yields no rules.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    debug!("Failed to read {}: {}", path.display(), err);
                }
                Self::default()
            }
        }
    }

    pub fn parse(text: &str) -> Self {
        let mut files: BTreeMap<PathBuf, BTreeSet<String>> = BTreeMap::new();
        let mut current: Option<PathBuf> = None;

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current = section
                    .trim()
                    .strip_prefix("file:")
                    .map(|name| PathBuf::from(name.trim()));
                continue;
            }
            let Some(file) = &current else { continue };
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if key.trim() != "ignore" {
                continue;
            }
            files.entry(file.clone()).or_default().extend(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|code| !code.is_empty())
                    .map(str::to_string),
            );
        }

        Self { files }
    }

    /// Codes ignored for the item at `path`.
    pub fn ignored_codes(&self, path: &Path) -> BTreeSet<String> {
        self.files
            .iter()
            .filter(|(name, _)| path.ends_with(name))
            .flat_map(|(_, codes)| codes.iter().cloned())
            .collect()
    }

    pub fn ignores(&self, code: &str, path: &Path) -> bool {
        self.files
            .iter()
            .any(|(name, codes)| path.ends_with(name) && codes.contains(code))
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
[file:Foo.yml]
ignore=BA101, RM104

[file:README.md]
ignore=RM106

[known_words]
ignore=IGNORED
Foo
";

    #[test]
    fn parses_file_sections() {
        let ignore = PackIgnore::parse(SAMPLE);
        let codes = ignore.ignored_codes(Path::new("/c/Packs/P/Integrations/Foo/Foo.yml"));
        assert_eq!(
            codes.into_iter().collect::<Vec<_>>(),
            vec!["BA101".to_string(), "RM104".to_string()]
        );
    }

    #[test]
    fn matches_by_path_tail_only() {
        let ignore = PackIgnore::parse(SAMPLE);
        assert!(ignore.ignores("BA101", Path::new("/x/Foo.yml")));
        assert!(!ignore.ignores("BA101", Path::new("/x/NotFoo.yml")));
        assert!(!ignore.ignores("RM106", Path::new("/x/Foo.yml")));
    }

    #[test]
    fn other_sections_are_ignored() {
        let ignore = PackIgnore::parse(SAMPLE);
        assert!(!ignore.ignores("IGNORED", Path::new("known_words")));
    }

    #[test]
    fn missing_file_yields_empty_rules() {
        let temp = TempDir::new().unwrap();
        let ignore = PackIgnore::load(&temp.path().join(".pack-ignore"));
        assert!(ignore.is_empty());
    }

    #[test]
    fn unknown_codes_are_kept() {
        let ignore = PackIgnore::parse("[file:a.yml]\nignore=ZZ999\n");
        assert!(ignore.ignores("ZZ999", Path::new("a.yml")));
    }
}
