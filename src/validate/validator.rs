//! Validator definitions.
//!
//! This module provides the core traits and types for defining validators:
//!
//! - [`Validator`] - the trait every validator implements
//! - [`ValidatorInfo`] - declarative metadata (code, applicability, messages)
//! - [`GraphRule`] with [`AllFilesMode`] and [`ListFilesMode`] - the split used
//!   by rules that query the whole content graph

use super::context::{ExecutionMode, ValidationContext};
use super::results::{FixResult, ValidationResult};
use crate::content::{Artifact, ContentType, GitStatus, RelatedFileKind};
use crate::error::{PacklintError, Result};
use std::path::PathBuf;

/// Declarative metadata of a validator.
#[derive(Debug, Clone, Copy)]
pub struct ValidatorInfo {
    /// Two-letter theme prefix plus three digits, e.g. `BA101`.
    pub code: &'static str,
    pub description: &'static str,
    pub rationale: &'static str,
    /// Message template; `{0}`, `{1}`... are positional arguments.
    pub error_message: &'static str,
    pub fix_message: Option<&'static str>,
    pub related_field: &'static str,
    pub content_types: &'static [ContentType],
    /// `None` means every status, including items with no git status.
    pub git_statuses: Option<&'static [GitStatus]>,
    /// `None` means every execution mode.
    pub execution_modes: Option<&'static [ExecutionMode]>,
    /// Related files consulted; the validator is skipped for an item when
    /// none of them exist or changed.
    pub related_files: &'static [RelatedFileKind],
    pub auto_fixable: bool,
    pub run_on_deprecated: bool,
}

impl ValidatorInfo {
    /// Defaults for struct-update syntax.
    pub const BASE: ValidatorInfo = ValidatorInfo {
        code: "",
        description: "",
        rationale: "",
        error_message: "",
        fix_message: None,
        related_field: "",
        content_types: &[],
        git_statuses: None,
        execution_modes: None,
        related_files: &[],
        auto_fixable: false,
        run_on_deprecated: false,
    };
}

/// A single rule over content items.
///
/// `obtain_invalid_content_items` must not mutate its inputs and must keep
/// item order in its output. `fix` is only called when `info().auto_fixable`
/// and mutates the artifact in place; it must be idempotent and must never
/// lower `fromversion` or broaden marketplaces.
pub trait Validator: Send + Sync {
    fn info(&self) -> ValidatorInfo;

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>>;

    fn fix(&self, item: &mut Artifact, _ctx: &ValidationContext<'_>) -> Result<FixResult> {
        Err(PacklintError::FixUnavailable {
            code: self.info().code.to_string(),
            message: format!("{} is not auto-fixable", item.path.display()),
        })
    }

    fn code(&self) -> &'static str {
        self.info().code
    }

    /// Build a result for `item` from this validator's message template.
    fn result(&self, item: &Artifact, args: &[&dyn std::fmt::Display]) -> ValidationResult {
        let info = self.info();
        ValidationResult::new(info.code, format_message(info.error_message, args), item)
            .with_fix_available(info.auto_fixable)
    }

    /// Build a fix result from this validator's fix template.
    fn fix_result(&self, item: &Artifact, args: &[&dyn std::fmt::Display]) -> FixResult {
        let info = self.info();
        FixResult::new(
            info.code,
            format_message(info.fix_message.unwrap_or(info.error_message), args),
            item,
        )
    }
}

/// Substitute `{0}`, `{1}`... in `template`.
pub fn format_message(template: &str, args: &[&dyn std::fmt::Display]) -> String {
    let mut message = template.to_string();
    for (index, arg) in args.iter().enumerate() {
        message = message.replace(&format!("{{{}}}", index), &arg.to_string());
    }
    message
}

/// A rule that needs the whole content graph.
///
/// Wrap it in [`AllFilesMode`] and [`ListFilesMode`] to register both
/// execution-mode variants.
pub trait GraphRule: Send + Sync {
    fn info(&self) -> ValidatorInfo;

    /// Query the graph; `paths` is `None` when validating every file.
    fn obtain_invalid_content_items_using_graph(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
        paths: Option<&[PathBuf]>,
    ) -> Result<Vec<ValidationResult>>;
}

/// Runs a [`GraphRule`] over the unfiltered graph in all-files mode.
pub struct AllFilesMode<R>(pub R);

/// Runs a [`GraphRule`] restricted to the selected files.
pub struct ListFilesMode<R>(pub R);

impl<R: GraphRule> Validator for AllFilesMode<R> {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            execution_modes: Some(&[ExecutionMode::AllFiles]),
            ..self.0.info()
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        self.0.obtain_invalid_content_items_using_graph(items, ctx, None)
    }
}

impl<R: GraphRule> Validator for ListFilesMode<R> {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            execution_modes: Some(&[ExecutionMode::SpecificFiles, ExecutionMode::UseGit]),
            ..self.0.info()
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        let paths: Vec<PathBuf> = items.iter().map(|item| item.path.clone()).collect();
        self.0
            .obtain_invalid_content_items_using_graph(items, ctx, Some(&paths))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_message_substitutes_positional_args() {
        let message = format_message("The name {1} does not match id {0}.", &[&"a", &"b"]);
        assert_eq!(message, "The name b does not match id a.");
    }

    #[test]
    fn format_message_repeats_and_ignores_extra() {
        assert_eq!(format_message("{0}-{0}", &[&1, &2]), "1-1");
        assert_eq!(format_message("no args", &[]), "no args");
    }

    struct CountingRule;

    impl GraphRule for CountingRule {
        fn info(&self) -> ValidatorInfo {
            ValidatorInfo {
                code: "GR999",
                ..ValidatorInfo::BASE
            }
        }

        fn obtain_invalid_content_items_using_graph(
            &self,
            _items: &[&Artifact],
            _ctx: &ValidationContext<'_>,
            _paths: Option<&[PathBuf]>,
        ) -> Result<Vec<ValidationResult>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn split_modes_bind_execution_modes() {
        let all = AllFilesMode(CountingRule);
        let list = ListFilesMode(CountingRule);

        assert_eq!(all.info().code, "GR999");
        assert_eq!(all.info().execution_modes, Some(&[ExecutionMode::AllFiles][..]));
        assert_eq!(
            list.info().execution_modes,
            Some(&[ExecutionMode::SpecificFiles, ExecutionMode::UseGit][..])
        );
    }
}
