//! Content graph rules (GR).
//!
//! Each rule is a [`GraphRule`]; the registry wraps it in both execution
//! modes. Graph results are mapped back to the validated items by path, so
//! results about items outside the current selection are dropped.

use super::{item_at, join};
use crate::content::{Artifact, ContentType};
use crate::error::Result;
use crate::graph::{GraphNode, Usage};
use crate::validate::context::ValidationContext;
use crate::validate::results::ValidationResult;
use crate::validate::validator::{format_message, GraphRule, ValidatorInfo};
use std::path::PathBuf;

/// Types that reference other content.
const USING_TYPES: &[ContentType] = &[
    ContentType::Integration,
    ContentType::Script,
    ContentType::Playbook,
    ContentType::TestPlaybook,
];

fn graph_result(
    info: &ValidatorInfo,
    items: &[&Artifact],
    path: Option<&std::path::Path>,
    args: &[&dyn std::fmt::Display],
) -> Option<ValidationResult> {
    let item = item_at(items, path?)?;
    Some(ValidationResult::new(
        info.code,
        format_message(info.error_message, args),
        item,
    ))
}

/// Collapse `(source, target)` pairs into one entry per source, keeping order.
fn group_by_source<'g>(
    pairs: impl IntoIterator<Item = (&'g GraphNode, String)>,
) -> Vec<(&'g GraphNode, Vec<String>)> {
    let mut grouped: Vec<(&GraphNode, Vec<String>)> = Vec::new();
    for (source, target) in pairs {
        match grouped.iter_mut().find(|(seen, _)| std::ptr::eq(*seen, source)) {
            Some((_, targets)) => {
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
            None => grouped.push((source, vec![target])),
        }
    }
    grouped
}

/// GR100: used content is available in every marketplace of its user.
pub struct MarketplaceContainment;

impl GraphRule for MarketplaceContainment {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "GR100",
            description: "Validate that content items only use content available in all of their marketplaces.",
            rationale: "An item breaks in a marketplace that lacks its dependencies.",
            error_message: "Content item '{0}' can be used in the '{1}' marketplaces, however it uses content items: '{2}' which are not supported in all of the marketplaces of '{0}'.",
            related_field: "marketplaces",
            content_types: USING_TYPES,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items_using_graph(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
        paths: Option<&[PathBuf]>,
    ) -> Result<Vec<ValidationResult>> {
        let info = self.info();
        let violations = ctx
            .graph
            .uses_items_not_in_marketplace(paths, &ctx.run.core_packs);

        let grouped = group_by_source(
            violations
                .into_iter()
                .map(|violation| (violation.source, violation.target.to_string())),
        );

        Ok(grouped
            .into_iter()
            .filter_map(|(source, targets)| {
                let marketplaces: Vec<&str> = source.marketplaces.iter().map(|m| m.as_str()).collect();
                graph_result(
                    &info,
                    items,
                    source.path.as_deref(),
                    &[&source.object_id, &join(&marketplaces), &join(&targets)],
                )
            })
            .collect())
    }
}

fn usage_results(info: &ValidatorInfo, items: &[&Artifact], usages: Vec<Usage<'_>>) -> Vec<ValidationResult> {
    let grouped = group_by_source(
        usages
            .into_iter()
            .map(|usage| (usage.source, usage.target.to_string())),
    );
    grouped
        .into_iter()
        .filter_map(|(source, targets)| {
            graph_result(
                info,
                items,
                source.path.as_deref(),
                &[&source.object_id, &join(&targets)],
            )
        })
        .collect()
}

/// GR103: every used item exists.
pub struct UnknownContent;

impl GraphRule for UnknownContent {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "GR103",
            description: "Validate that content items only use content that exists.",
            rationale: "References to missing content fail at runtime.",
            error_message: "Content item '{0}' is using content items: {1} which cannot be found in the repository.",
            related_field: "tasks",
            content_types: USING_TYPES,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items_using_graph(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
        paths: Option<&[PathBuf]>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(usage_results(
            &self.info(),
            items,
            ctx.graph.unknown_content_usages(paths),
        ))
    }
}

/// GR105: display names are unique within a type and marketplace.
pub struct DuplicateDisplayNames;

impl GraphRule for DuplicateDisplayNames {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "GR105",
            description: "Validate that display names are unique per content type.",
            rationale: "Users cannot tell apart items with the same name.",
            error_message: "The content item '{0}' has the same display name as: {1}.",
            related_field: "name",
            content_types: &[
                ContentType::Integration,
                ContentType::Script,
                ContentType::Playbook,
                ContentType::IncidentField,
                ContentType::IncidentType,
                ContentType::IndicatorField,
                ContentType::IndicatorType,
                ContentType::Layout,
                ContentType::Mapper,
                ContentType::Classifier,
                ContentType::Dashboard,
                ContentType::Widget,
                ContentType::Report,
                ContentType::Trigger,
                ContentType::Job,
                ContentType::List,
                ContentType::Wizard,
            ],
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items_using_graph(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
        paths: Option<&[PathBuf]>,
    ) -> Result<Vec<ValidationResult>> {
        let info = self.info();
        Ok(ctx
            .graph
            .duplicate_display_names(None, paths)
            .into_iter()
            .filter_map(|duplicate| {
                let others: Vec<String> = duplicate
                    .duplicates
                    .iter()
                    .map(|node| match &node.pack {
                        Some(pack) => format!("{} (pack {})", node.object_id, pack),
                        None => node.object_id.clone(),
                    })
                    .collect();
                graph_result(
                    &info,
                    items,
                    duplicate.node.path.as_deref(),
                    &[&duplicate.node.object_id, &join(&others)],
                )
            })
            .collect())
    }
}

/// GR107: non-deprecated items do not use deprecated ones.
pub struct DeprecatedUsage;

impl GraphRule for DeprecatedUsage {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "GR107",
            description: "Validate that content items do not use deprecated content.",
            rationale: "Deprecated content is removed in later releases.",
            error_message: "The content item '{0}' uses the following deprecated content items: {1}.",
            related_field: "deprecated",
            content_types: USING_TYPES,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items_using_graph(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
        paths: Option<&[PathBuf]>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(usage_results(
            &self.info(),
            items,
            ctx.graph.deprecated_usages(paths),
        ))
    }
}

/// GR109: an item runs only in modules its dependencies support.
pub struct ModuleCompatibility;

impl GraphRule for ModuleCompatibility {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "GR109",
            description: "For a dependency where Content Item A relies on Content Item B, the supportedModules of Content Item A must be a subset of Content Item B's supportedModules.",
            rationale: "An item cannot run in a module where the content it uses is unavailable.",
            error_message: "The following mandatory dependencies missing required modules: {0}",
            related_field: "supportedModules",
            content_types: USING_TYPES,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items_using_graph(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
        paths: Option<&[PathBuf]>,
    ) -> Result<Vec<ValidationResult>> {
        let info = self.info();
        Ok(ctx
            .graph
            .module_mismatches(paths)
            .into_iter()
            .filter_map(|mismatch| {
                let described: Vec<String> = mismatch
                    .missing
                    .iter()
                    .map(|(target, modules)| format!("{} is missing: [{}]", target.object_id, join(modules)))
                    .collect();
                graph_result(&info, items, mismatch.source.path.as_deref(), &[&join(&described)])
            })
            .collect())
    }
}
