//! Release note rules (RN).
//!
//! Release notes are validated as items of their own; RN106 and RN107 look
//! at changed content items and ask whether their pack's new note covers
//! them.

use super::{join, ITEM_TYPES};
use crate::content::integration::docker_image;
use crate::content::{Artifact, ContentType, GitStatus};
use crate::error::{PacklintError, Result};
use crate::release_notes::{
    breaking_changes_json_path, docker_entry, empty_known_headers, extract_rn_headers,
    has_first_level_header, header_content_type, is_filled_out, mentions_breaking_change,
    set_docker_entry,
};
use crate::validate::context::{ExecutionMode, ValidationContext};
use crate::validate::results::{FixResult, ValidationResult};
use crate::validate::validator::{format_message, Validator, ValidatorInfo};
use semver::Version;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

const RELEASE_NOTE: &[ContentType] = &[ContentType::ReleaseNote];

fn needs_note(item: &Artifact) -> bool {
    item.content_type != ContentType::TestPlaybook && !item.is_silent()
}

fn same_pack(a: &Artifact, b: &Artifact) -> bool {
    match (&a.pack, &b.pack) {
        (Some(a), Some(b)) => a.path == b.path,
        _ => false,
    }
}

/// The release note added in `item`'s pack during this run.
fn added_note<'a>(item: &Artifact, ctx: &ValidationContext<'a>) -> Option<&'a Artifact> {
    ctx.selected.iter().find(|candidate| {
        candidate.content_type == ContentType::ReleaseNote
            && candidate.is_new()
            && same_pack(candidate, item)
    })
}

/// RN103: no placeholders and no empty notes.
pub struct FilledOut;

impl Validator for FilledOut {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RN103",
            description: "Validate that the release notes are filled out.",
            rationale: "Placeholders left by the generator end up in the published changelog.",
            error_message: "Please complete the release notes and ensure all placeholders are filled in.",
            content_types: RELEASE_NOTE,
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
            .filter(|item| !is_filled_out(item.text()))
            .map(|item| self.result(item, &[]))
            .collect())
    }
}

/// RN105: at most one new release note per pack.
pub struct SingleAddedNote;

impl Validator for SingleAddedNote {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RN105",
            description: "Validate that a pack gains at most one release note per change.",
            rationale: "Each version bump is described by exactly one note.",
            error_message: "Pack {0} has more than one new release note: {1}.",
            content_types: RELEASE_NOTE,
            git_statuses: Some(&[GitStatus::Added]),
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        let mut by_pack: BTreeMap<&str, Vec<&Artifact>> = BTreeMap::new();
        for item in items.iter().filter(|item| item.is_new()) {
            if let Some(pack) = item.pack_name() {
                by_pack.entry(pack).or_default().push(item);
            }
        }

        let mut results = Vec::new();
        for (pack, notes) in by_pack.into_iter().filter(|(_, notes)| notes.len() > 1) {
            let names: Vec<String> = notes
                .iter()
                .filter_map(|note| note.path.file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .collect();
            let listed = join(&names);
            results.extend(notes.iter().map(|note| self.result(note, &[&pack, &listed])));
        }
        Ok(results)
    }
}

/// RN106: a changed pack past its first version has a new release note.
pub struct NoteExists;

fn released_version(item: &Artifact) -> Option<Version> {
    item.pack_metadata()?
        .current_version()
        .filter(|version| *version > Version::new(1, 0, 0))
}

fn renamed_within_pack(item: &Artifact) -> bool {
    let (Some(old_path), Some(pack)) = (&item.old_path, &item.pack) else {
        return false;
    };
    item.git_status == Some(GitStatus::Renamed) && old_path.starts_with(&pack.path)
}

fn pack_is_new(item: &Artifact, ctx: &ValidationContext<'_>) -> bool {
    ctx.selected.iter().any(|candidate| {
        candidate.content_type == ContentType::Pack && candidate.is_new() && same_pack(candidate, item)
    })
}

impl Validator for NoteExists {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RN106",
            description: "Validate that a release note exists for every changed pack.",
            rationale: "Users learn about changes from the release notes.",
            error_message: "Release notes were not found for pack {0}, which is at version {1}. Please add a release note for the changes in {2}.",
            content_types: ITEM_TYPES,
            git_statuses: Some(&[GitStatus::Added, GitStatus::Modified, GitStatus::Renamed]),
            execution_modes: Some(&[ExecutionMode::UseGit]),
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        let info = self.info();
        let mut missing: BTreeMap<&Path, (&Artifact, Version, Vec<String>)> = BTreeMap::new();

        for item in items {
            if !needs_note(item) || renamed_within_pack(item) {
                continue;
            }
            let (Some(pack), Some(version)) = (&item.pack, released_version(item)) else {
                continue;
            };
            if added_note(item, ctx).is_some() || pack_is_new(item, ctx) {
                continue;
            }
            missing
                .entry(pack.path.as_path())
                .or_insert_with(|| (*item, version, Vec::new()))
                .2
                .push(item.relative_path(&pack.path));
        }

        Ok(missing
            .into_iter()
            .map(|(pack_path, (item, version, changed))| {
                let message = format_message(
                    info.error_message,
                    &[&item.pack_name().unwrap_or_default(), &version, &join(&changed)],
                );
                ValidationResult::new(info.code, message, item)
                    .with_path(pack_path.join("pack_metadata.json"))
            })
            .collect())
    }
}

/// RN107: every changed item is mentioned in its pack's new release note.
pub struct ItemMentioned;

fn mentioned(note: &str, item: &Artifact, force: bool) -> bool {
    let Some(header) = item.content_type.release_note_header() else {
        return true;
    };
    let name = item.display_name();
    extract_rn_headers(note, force)
        .iter()
        .filter(|(written, _)| written.eq_ignore_ascii_case(header))
        .any(|(_, names)| names.iter().any(|listed| listed == &name))
}

impl Validator for ItemMentioned {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RN107",
            description: "Validate that every changed item has an entry in its pack's release note.",
            rationale: "A release note that omits a change misleads users.",
            error_message: "No release note entry was found for the {0} '{1}'. Please add it under the '{2}' header.",
            content_types: ITEM_TYPES,
            git_statuses: Some(&[GitStatus::Added, GitStatus::Modified, GitStatus::Renamed]),
            execution_modes: Some(&[ExecutionMode::UseGit]),
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        let force = ctx.run.force_rn_headers;
        Ok(items
            .iter()
            .filter(|item| needs_note(item))
            .filter_map(|item| {
                let note = added_note(item, ctx)?;
                if mentioned(note.text(), item, force) {
                    return None;
                }
                let header = item.content_type.release_note_header()?;
                Some(
                    self.result(item, &[&item.content_type, &item.display_name(), &header])
                        .with_path(note.path.clone()),
                )
            })
            .collect())
    }
}

/// RN108: a new pack starts without release notes.
pub struct NewPackHasNoNotes;

impl Validator for NewPackHasNoNotes {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RN108",
            description: "Validate that new packs do not have release notes.",
            rationale: "The first version of a pack is described by its README.",
            error_message: "Pack {0} is new and must not have release notes; remove {1}.",
            content_types: RELEASE_NOTE,
            git_statuses: Some(&[GitStatus::Added]),
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(items
            .iter()
            .filter(|item| pack_is_new(item, ctx))
            .map(|item| {
                let file = item
                    .path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.result(item, &[&item.pack_name().unwrap_or_default(), &file])
            })
            .collect())
    }
}

/// RN111: the release note's docker entry matches the YML image.
pub struct DockerEntryMatches;

/// The docker entry the note should carry for `item`, if any.
fn expected_docker_entry(item: &Artifact) -> Option<String> {
    let current = docker_image(item)?;
    let previous = item.old_base.as_deref().and_then(docker_image);
    (previous != Some(current)).then(|| current.to_string())
}

fn docker_mismatch(item: &Artifact, note: &str) -> Option<(Option<String>, Option<String>)> {
    let written = docker_entry(note, &item.display_name());
    let expected = expected_docker_entry(item);
    let current = docker_image(item);
    let consistent = match (&expected, &written) {
        (Some(expected), Some(written)) => expected == written,
        (Some(_), None) => false,
        (None, None) => true,
        (None, Some(written)) => current == Some(written.as_str()),
    };
    (!consistent).then_some((written, expected))
}

impl Validator for DockerEntryMatches {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RN111",
            description: "Validate that the docker image in the release note matches the YML.",
            rationale: "Release notes announce image bumps users may depend on.",
            error_message: "The docker entry in the release note for '{0}' is {1}, but it should be {2}.",
            fix_message: Some("Set the release note docker entry for '{0}' to {1}."),
            related_field: "dockerimage",
            content_types: &[ContentType::Integration, ContentType::Script],
            git_statuses: Some(&[GitStatus::Modified, GitStatus::Renamed]),
            auto_fixable: true,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(items
            .iter()
            .filter_map(|item| {
                let note = added_note(item, ctx)?;
                let (written, expected) = docker_mismatch(item, note.text())?;
                Some(self.result(
                    item,
                    &[
                        &item.display_name(),
                        &written.unwrap_or_else(|| "missing".into()),
                        &expected.unwrap_or_else(|| "absent".into()),
                    ],
                ))
            })
            .collect())
    }

    fn fix(&self, item: &mut Artifact, ctx: &ValidationContext<'_>) -> Result<FixResult> {
        let unavailable = |message: &str| PacklintError::FixUnavailable {
            code: "RN111".into(),
            message: message.to_string(),
        };
        let note = added_note(item, ctx).ok_or_else(|| unavailable("no release note was added"))?;
        let text = std::fs::read_to_string(&note.path)?;
        let expected = expected_docker_entry(item);
        let updated = set_docker_entry(&text, &item.display_name(), expected.as_deref())
            .ok_or_else(|| unavailable("the release note has no entry for this item"))?;
        std::fs::write(&note.path, updated)?;
        debug!("Rewrote docker entry in {}", note.path.display());
        Ok(self.fix_result(
            item,
            &[&item.display_name(), &expected.unwrap_or_else(|| "nothing".into())],
        ))
    }
}

/// RN112: breaking changes are declared in the sibling JSON.
pub struct BreakingChangeJson;

fn declares_breaking_changes(json_path: &Path) -> bool {
    std::fs::read_to_string(json_path)
        .ok()
        .and_then(|text| serde_json::from_str::<Value>(&text).ok())
        .is_some_and(|value| value.get("breakingChanges") == Some(&json!(true)))
}

impl Validator for BreakingChangeJson {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RN112",
            description: "Validate that release notes mentioning breaking changes have a matching JSON file.",
            rationale: "The marketplace only warns about breaking changes declared in the JSON file.",
            error_message: "The release note mentions a breaking change but {0} does not declare breakingChanges: true.",
            content_types: RELEASE_NOTE,
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
            .filter(|item| mentions_breaking_change(item.text()))
            .filter_map(|item| {
                let json_path = breaking_changes_json_path(&item.path);
                if declares_breaking_changes(&json_path) {
                    return None;
                }
                let name = json_path.file_name()?.to_string_lossy().into_owned();
                Some(self.result(item, &[&name]))
            })
            .collect())
    }
}

/// RN114: headers name known content types and items of the pack.
pub struct KnownHeaders;

impl KnownHeaders {
    fn problems(&self, item: &Artifact, ctx: &ValidationContext<'_>) -> Vec<String> {
        let pack = item.pack_name().unwrap_or_default();
        let mut unknown_headers = Vec::new();
        let mut unknown_items = Vec::new();

        for (header, names) in extract_rn_headers(item.text(), ctx.run.force_rn_headers) {
            let Some(content_type) = header_content_type(&header) else {
                unknown_headers.push(header);
                continue;
            };
            for name in names {
                let found = !ctx
                    .graph
                    .search(content_type, &[("pack", json!(pack)), ("display_name", json!(name))])
                    .is_empty()
                    || !ctx
                        .graph
                        .search(content_type, &[("pack", json!(pack)), ("object_id", json!(name))])
                        .is_empty();
                if !found {
                    unknown_items.push(format!("{} ({})", name, header));
                }
            }
        }

        let mut problems = Vec::new();
        if !unknown_headers.is_empty() {
            problems.push(format!("unknown headers: {}", join(&unknown_headers)));
        }
        if !unknown_items.is_empty() {
            problems.push(format!("items not found in pack {}: {}", pack, join(&unknown_items)));
        }
        problems
    }
}

impl Validator for KnownHeaders {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RN114",
            description: "Validate that release note headers name content types and items that exist.",
            rationale: "Misspelled headers are dropped from the rendered changelog.",
            error_message: "The release note has {0}.",
            content_types: RELEASE_NOTE,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(items
            .iter()
            .filter_map(|item| {
                let problems = self.problems(item, ctx);
                (!problems.is_empty()).then(|| self.result(item, &[&problems.join("; ")]))
            })
            .collect())
    }
}

/// RN115: the note opens at least one content-type header.
pub struct HasFirstLevelHeader;

impl Validator for HasFirstLevelHeader {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RN115",
            description: "Validate that the release note has at least one first-level header.",
            rationale: "Entries outside a content-type header are not rendered.",
            error_message: "The release note has no first-level header such as '#### Integrations'.",
            content_types: RELEASE_NOTE,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(items
            .iter()
            .filter(|item| !has_first_level_header(item.text(), ctx.run.force_rn_headers))
            .map(|item| self.result(item, &[]))
            .collect())
    }
}

/// RN116: every known header carries at least one entry.
pub struct NoEmptyHeaders;

impl Validator for NoEmptyHeaders {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "RN116",
            description: "Validate that release note headers are not empty.",
            rationale: "An empty header renders as a dangling title.",
            error_message: "The following release note headers have no entries: {0}.",
            content_types: RELEASE_NOTE,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(items
            .iter()
            .filter_map(|item| {
                let empty = empty_known_headers(item.text(), ctx.run.force_rn_headers);
                (!empty.is_empty()).then(|| self.result(item, &[&join(&empty)]))
            })
            .collect())
    }
}
