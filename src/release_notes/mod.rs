//! Release-note parsing helpers.
//!
//! A release note is a markdown file under `ReleaseNotes/<x_y_z>.md`. Its
//! first-level headers name content kinds (`#### Integrations`), and its
//! second-level headers name items (`##### My Integration`). With the force
//! flag, `## ` is accepted as a first-level header as well.

use crate::content::ContentType;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Tokens left behind by the release-note generator.
pub const PLACEHOLDERS: &[&str] = &["%%UPDATE_RN%%", "%%XSIAM_VERSION%%", "%%UPDATE_CONTENT_ITEM_"];

const DOCKER_ENTRY_PREFIX: &str = "Updated the Docker image to: ";

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

/// One first-level section of a release note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RnSection {
    /// Header text as written.
    pub header: String,
    /// Names of the `#####` item headers, with `New:` and bold markers removed.
    pub items: Vec<String>,
    /// Non-blank lines of the section, item headers included.
    pub entries: Vec<String>,
}

fn first_level_header(line: &str, force: bool) -> Option<&str> {
    let line = line.trim_end();
    if let Some(header) = line.strip_prefix("#### ") {
        return Some(header.trim());
    }
    if force {
        if let Some(header) = line.strip_prefix("## ") {
            return Some(header.trim());
        }
    }
    None
}

fn clean_item_name(raw: &str) -> String {
    let name = raw.trim();
    let name = name.strip_prefix("New:").unwrap_or(name).trim();
    name.trim_matches('*').trim().to_string()
}

/// Split a release note into its first-level sections.
pub fn sections(text: &str, force: bool) -> Vec<RnSection> {
    let mut sections: Vec<RnSection> = Vec::new();
    for line in strip_comments(text).lines() {
        if let Some(header) = first_level_header(line, force) {
            sections.push(RnSection {
                header: header.to_string(),
                items: Vec::new(),
                entries: Vec::new(),
            });
            continue;
        }
        let Some(current) = sections.last_mut() else {
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }
        if let Some(item) = line.trim_end().strip_prefix("##### ") {
            current.items.push(clean_item_name(item));
        }
        current.entries.push(line.trim_end().to_string());
    }
    sections
}

/// Map of first-level header to the item names listed under it.
pub fn extract_rn_headers(text: &str, force: bool) -> BTreeMap<String, Vec<String>> {
    let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for section in sections(text, force) {
        headers
            .entry(section.header)
            .or_default()
            .extend(section.items);
    }
    headers
}

/// Content type named by a first-level header, compared case-insensitively.
pub fn header_content_type(header: &str) -> Option<ContentType> {
    ContentType::ALL.into_iter().find(|ct| {
        ct.release_note_header()
            .is_some_and(|known| known.eq_ignore_ascii_case(header.trim()))
    })
}

pub fn has_first_level_header(text: &str, force: bool) -> bool {
    strip_comments(text)
        .lines()
        .any(|line| first_level_header(line, force).is_some())
}

/// Known headers whose sections have no entries.
pub fn empty_known_headers(text: &str, force: bool) -> Vec<String> {
    sections(text, force)
        .into_iter()
        .filter(|s| header_content_type(&s.header).is_some() && s.entries.is_empty())
        .map(|s| s.header)
        .collect()
}

pub fn strip_comments(text: &str) -> String {
    HTML_COMMENT.replace_all(text, "").into_owned()
}

/// False when the note is empty after removing comments or still has a placeholder.
pub fn is_filled_out(text: &str) -> bool {
    let stripped = strip_comments(text);
    !stripped.trim().is_empty() && !PLACEHOLDERS.iter().any(|p| stripped.contains(p))
}

pub fn mentions_breaking_change(text: &str) -> bool {
    text.to_ascii_lowercase().contains("breaking change")
}

/// The sibling `.json` holding breaking-change metadata.
pub fn breaking_changes_json_path(rn_path: &Path) -> PathBuf {
    rn_path.with_extension("json")
}

/// Split into `##### ` item blocks: (item name, block text including header).
fn item_blocks(text: &str) -> Vec<(String, std::ops::Range<usize>)> {
    let mut starts: Vec<(usize, String)> = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let bare = line.trim_end();
        if let Some(name) = bare.strip_prefix("##### ") {
            starts.push((offset, clean_item_name(name)));
        } else if first_level_header(bare, true).is_some() && !starts.is_empty() {
            starts.push((offset, String::new()));
        }
        offset += line.len();
    }
    let mut blocks = Vec::new();
    for (index, (start, name)) in starts.iter().enumerate() {
        if name.is_empty() {
            continue;
        }
        let end = starts.get(index + 1).map(|(s, _)| *s).unwrap_or(text.len());
        blocks.push((name.clone(), *start..end));
    }
    blocks
}

/// The docker image declared for `item_name`, if the note has an entry.
pub fn docker_entry(text: &str, item_name: &str) -> Option<String> {
    item_blocks(text)
        .into_iter()
        .filter(|(name, _)| name == item_name)
        .find_map(|(_, range)| {
            text[range].lines().find_map(|line| {
                let entry = line.trim().strip_prefix("- ")?.strip_prefix(DOCKER_ENTRY_PREFIX)?;
                let start = entry.find('*')? + 1;
                let end = entry.rfind('*')?;
                (start <= end).then(|| entry[start..end].to_string())
            })
        })
}

/// Rewrite the docker entry of `item_name`: replace, add or (with `None`) remove it.
///
/// Returns `None` when the note has no block for the item.
pub fn set_docker_entry(text: &str, item_name: &str, image: Option<&str>) -> Option<String> {
    let (_, range) = item_blocks(text)
        .into_iter()
        .find(|(name, _)| name == item_name)?;
    let block = &text[range.clone()];
    let wanted = image.map(|image| format!("- {}*{}*.", DOCKER_ENTRY_PREFIX, image));

    let mut lines: Vec<String> = Vec::new();
    let mut replaced = false;
    for line in block.lines() {
        if line.trim().starts_with(&format!("- {}", DOCKER_ENTRY_PREFIX)) {
            if let Some(wanted) = &wanted {
                lines.push(wanted.clone());
            }
            replaced = true;
        } else {
            lines.push(line.to_string());
        }
    }
    if !replaced {
        if let Some(wanted) = wanted {
            while lines.last().is_some_and(|l| l.trim().is_empty()) {
                lines.pop();
            }
            lines.push(wanted);
            lines.push(String::new());
        }
    }

    let mut new_block = lines.join("\n");
    if block.ends_with('\n') {
        new_block.push('\n');
    }
    Some(format!("{}{}{}", &text[..range.start], new_block, &text[range.end..]))
}
