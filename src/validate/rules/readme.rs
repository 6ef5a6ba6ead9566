//! README rules (RM).

use super::{copyright_lines, internal_terms, join};
use crate::content::integration::{command_names, commands, command_name, output_paths};
use crate::content::{Artifact, ContentType, RelatedFile, RelatedFileKind, Support};
use crate::error::Result;
use crate::validate::context::ValidationContext;
use crate::validate::results::ValidationResult;
use crate::validate::validator::{Validator, ValidatorInfo};
use regex::Regex;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::LazyLock;

const DOCUMENTED_TYPES: &[ContentType] = &[
    ContentType::Integration,
    ContentType::Script,
    ContentType::Playbook,
    ContentType::Pack,
];

/// Sections that may be left out but must not be left empty.
const OPTIONAL_SECTIONS: &[&str] = &[
    "Troubleshooting",
    "Use Cases",
    "Known Limitations",
    "Additional Information",
];

/// Commands a README does not need to document.
const UNDOCUMENTED_COMMANDS: &[&str] = &[
    "test-module",
    "fetch-incidents",
    "fetch-events",
    "get-mapping-fields",
    "get-remote-data",
    "update-remote-system",
    "get-modified-remote-data",
];

const PLACEHOLDERS: &[&str] = &["FILL IN REQUIRED PERMISSIONS HERE", "FILL HERE"];

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*#*\s*$").expect("valid heading regex"));
static MARKDOWN_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\(\s*<?([^)\s>]+)").expect("valid image regex"));
static HTML_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]*\ssrc\s*=\s*["']([^"']+)["']"#).expect("valid img regex")
});

/// A markdown heading and the lines up to the next heading.
struct Section<'a> {
    level: usize,
    title: &'a str,
    body: Vec<&'a str>,
}

fn sections(text: &str) -> Vec<Section<'_>> {
    let mut found: Vec<Section<'_>> = Vec::new();
    for line in text.lines() {
        match HEADING.captures(line) {
            Some(caps) => {
                let (Some(hashes), Some(title)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                found.push(Section {
                    level: hashes.as_str().len(),
                    title: title.as_str(),
                    body: Vec::new(),
                });
            }
            None => {
                if let Some(current) = found.last_mut() {
                    current.body.push(line);
                }
            }
        }
    }
    found
}

/// The README, when it exists.
fn readme(item: &Artifact) -> Option<&RelatedFile> {
    item.related_file(RelatedFileKind::Readme)
        .filter(|file| file.exist())
}

/// Run `check` over the README text, reporting on the README path.
fn readme_results<V, F>(validator: &V, items: &[&Artifact], check: F) -> Vec<ValidationResult>
where
    V: Validator + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    items
        .iter()
        .filter_map(|item| {
            let file = readme(item)?;
            let found = check(file.text())?;
            Some(validator.result(item, &[&found]).with_path(file.path()))
        })
        .collect()
}

/// RM100: optional sections must have content when present.
pub struct EmptySections;

impl Validator for EmptySections {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RM100",
            description: "Validate that optional README sections are not left empty.",
            rationale: "An empty section looks unfinished.",
            error_message: "The following sections are empty: {0}. Please fill them in or remove them.",
            related_field: "readme",
            content_types: DOCUMENTED_TYPES,
            related_files: &[RelatedFileKind::Readme],
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(readme_results(self, items, |text| {
            let empty: Vec<&str> = sections(text)
                .iter()
                .filter(|s| OPTIONAL_SECTIONS.iter().any(|name| name.eq_ignore_ascii_case(s.title)))
                .filter(|s| s.body.iter().all(|line| line.trim().is_empty()))
                .map(|s| s.title)
                .collect();
            (!empty.is_empty()).then(|| join(&empty))
        }))
    }
}

/// RM104: partner packs and packs with playbooks need a README.
pub struct PackReadmeRequired;

impl Validator for PackReadmeRequired {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RM104",
            description: "Validate that partner packs and packs with playbooks have a non-empty README.",
            rationale: "The pack README is the pack's landing page.",
            error_message: "Pack {0} must have a non-empty README file because it {1}.",
            related_field: "readme",
            content_types: &[ContentType::Pack],
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        let mut results = Vec::new();
        for item in items {
            let Some(pack) = item.pack_name() else {
                continue;
            };
            let reason = if item.support() == Support::Partner {
                "is a partner pack"
            } else if !ctx
                .graph
                .search(ContentType::Playbook, &[("pack", json!(pack))])
                .is_empty()
            {
                "contains playbooks"
            } else {
                continue;
            };
            let filled = readme(item).is_some_and(|file| !file.text().trim().is_empty());
            if !filled {
                let path = item
                    .related_file(RelatedFileKind::Readme)
                    .map(RelatedFile::path)
                    .unwrap_or_else(|| item.path.clone());
                results.push(self.result(item, &[&item.name(), &reason]).with_path(path));
            }
        }
        Ok(results)
    }
}

/// RM106: READMEs must not use internal terms.
pub struct ReadmeTerms;

impl Validator for ReadmeTerms {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RM106",
            description: "Validate that the README does not use internal terms.",
            rationale: "READMEs are published as-is.",
            error_message: "The README contains internal terms: {0}.",
            related_field: "readme",
            content_types: DOCUMENTED_TYPES,
            related_files: &[RelatedFileKind::Readme],
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(readme_results(self, items, |text| {
            let terms = internal_terms(text);
            (!terms.is_empty()).then(|| join(&terms))
        }))
    }
}

/// Image links that are not relative `doc_files/` paths.
fn invalid_image_links(text: &str) -> Vec<String> {
    MARKDOWN_IMAGE
        .captures_iter(text)
        .chain(HTML_IMAGE.captures_iter(text))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|link| {
            let lower = link.to_ascii_lowercase();
            lower.starts_with("http://")
                || lower.starts_with("https://")
                || !link.contains("doc_files/")
        })
        .map(str::to_string)
        .collect()
}

/// RM108: images are relative links under `doc_files/`.
pub struct ImagePaths;

impl Validator for ImagePaths {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RM108",
            description: "Validate that images in README and description files are relative paths under doc_files.",
            rationale: "Absolute links break when the content moves.",
            error_message: "The following image links are not relative paths under doc_files: {0}.",
            related_field: "readme",
            content_types: DOCUMENTED_TYPES,
            related_files: &[RelatedFileKind::Readme, RelatedFileKind::Description],
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        let mut results = Vec::new();
        for item in items {
            for kind in [RelatedFileKind::Readme, RelatedFileKind::Description] {
                let Some(file) = item.related_file(kind).filter(|f| f.exist()) else {
                    continue;
                };
                let links = invalid_image_links(file.text());
                if !links.is_empty() {
                    results.push(self.result(item, &[&join(&links)]).with_path(file.path()));
                }
            }
        }
        Ok(results)
    }
}

fn is_documented_command_exempt(command: &str) -> bool {
    UNDOCUMENTED_COMMANDS.contains(&command) || command.ends_with("get-indicators")
}

/// Whether the README has a heading for `command` or shows `!command`.
fn documents_command(text: &str, command: &str) -> bool {
    let has_heading = sections(text)
        .iter()
        .any(|s| s.title.trim_matches('`').trim() == command);
    has_heading
        || text.match_indices('!').any(|(index, _)| {
            let rest = &text[index + 1..];
            rest.starts_with(command)
                && rest[command.len()..]
                    .chars()
                    .next()
                    .is_none_or(|c| c.is_whitespace() || c == '`')
        })
}

/// RM110: every command is documented in the README.
pub struct CommandsDocumented;

impl Validator for CommandsDocumented {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RM110",
            description: "Validate that every integration command is documented in the README.",
            rationale: "Undocumented commands are invisible to users.",
            error_message: "The following commands appear in the YML but are not documented in the README: {0}.",
            related_field: "readme",
            content_types: &[ContentType::Integration],
            related_files: &[RelatedFileKind::Readme],
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(items
            .iter()
            .filter_map(|item| {
                let file = readme(item)?;
                let missing: Vec<String> = command_names(item)
                    .into_iter()
                    .filter(|command| !is_documented_command_exempt(command))
                    .filter(|command| !documents_command(file.text(), command))
                    .collect();
                (!missing.is_empty())
                    .then(|| self.result(item, &[&join(&missing)]).with_path(file.path()))
            })
            .collect())
    }
}

/// Context paths in the output table of the `### command` section.
///
/// `None` when the README has no section for the command.
fn documented_outputs(text: &str, command: &str) -> Option<BTreeSet<String>> {
    let all = sections(text);
    let start = all
        .iter()
        .position(|s| s.level == 3 && s.title.trim_matches('`').trim() == command)?;
    let mut outputs = BTreeSet::new();
    for section in all[start + 1..].iter().take_while(|s| s.level > 3) {
        if !section.title.to_ascii_lowercase().contains("context output") {
            continue;
        }
        for line in &section.body {
            let line = line.trim();
            if !line.starts_with('|') {
                continue;
            }
            let Some(first) = line.trim_matches('|').split('|').next() else {
                continue;
            };
            let path = first.trim().trim_matches(|c| c == '*' || c == '`').trim();
            if path.is_empty() || path.eq_ignore_ascii_case("path") || path.starts_with("---") {
                continue;
            }
            outputs.insert(path.to_string());
        }
    }
    Some(outputs)
}

/// RM112: documented outputs match the YML outputs.
pub struct OutputsMatch;

impl Validator for OutputsMatch {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RM112",
            description: "Validate that the context outputs in the README match the YML.",
            rationale: "Stale output tables mislead playbook authors.",
            error_message: "The context outputs of the README and the YML differ: {0}.",
            related_field: "outputs",
            content_types: &[ContentType::Integration],
            related_files: &[RelatedFileKind::Readme],
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        let mut results = Vec::new();
        for item in items {
            let Some(file) = readme(item) else {
                continue;
            };
            let mut problems = Vec::new();
            for command in commands(item) {
                let name = command_name(command);
                let Some(documented) = documented_outputs(file.text(), name) else {
                    continue;
                };
                let declared: BTreeSet<String> =
                    output_paths(command.get("outputs")).into_iter().collect();
                let undeclared: Vec<&String> = documented.difference(&declared).collect();
                let undocumented: Vec<&String> = declared.difference(&documented).collect();
                if !undeclared.is_empty() {
                    problems.push(format!(
                        "{} documents outputs missing from the YML: {}",
                        name,
                        join(&undeclared.iter().map(|s| s.as_str()).collect::<Vec<_>>())
                    ));
                }
                if !undocumented.is_empty() {
                    problems.push(format!(
                        "{} has outputs missing from the README: {}",
                        name,
                        join(&undocumented.iter().map(|s| s.as_str()).collect::<Vec<_>>())
                    ));
                }
            }
            if !problems.is_empty() {
                results.push(self.result(item, &[&problems.join("; ")]).with_path(file.path()));
            }
        }
        Ok(results)
    }
}

/// RM113: READMEs must not carry copyright notices.
pub struct NoCopyrightInReadme;

impl Validator for NoCopyrightInReadme {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RM113",
            description: "Validate that the README has no copyright words.",
            rationale: "Content is published under the repository license only.",
            error_message: "Invalid keywords related to Copyrights (BSD, MIT, Copyright, proprietary) were found in lines: {0}",
            related_field: "readme",
            content_types: DOCUMENTED_TYPES,
            related_files: &[RelatedFileKind::Readme],
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(readme_results(self, items, |text| {
            let lines: Vec<String> = copyright_lines(text).iter().map(ToString::to_string).collect();
            (!lines.is_empty()).then(|| join(&lines))
        }))
    }
}

/// RM114: READMEs must not contain template placeholders.
pub struct NoPlaceholders;

impl Validator for NoPlaceholders {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RM114",
            description: "Validate that the README contains no template placeholders.",
            rationale: "Placeholders mean the README was never finished.",
            error_message: "The README contains the following placeholders which must be replaced: {0}.",
            related_field: "readme",
            content_types: DOCUMENTED_TYPES,
            related_files: &[RelatedFileKind::Readme],
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(readme_results(self, items, |text| {
            let mut remaining = text.to_string();
            let mut found = Vec::new();
            for placeholder in PLACEHOLDERS {
                if remaining.contains(placeholder) {
                    found.push(*placeholder);
                    remaining = remaining.replace(placeholder, "");
                }
            }
            (!found.is_empty()).then(|| join(&found))
        }))
    }
}
