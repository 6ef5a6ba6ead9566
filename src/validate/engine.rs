//! The validate engine: runs the catalog over the selection, then the fix pass.

use super::context::{RunContext, ValidationContext};
use super::registry::ValidatorRegistry;
use super::results::{FixOutcome, ResultCollector, RunReport, Severity, ValidationResult};
use super::selection::{should_run, Selection};
use super::validator::Validator;
use crate::codec;
use crate::content::{Artifact, ContentLoader};
use crate::error::Result;
use crate::graph::ContentGraph;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Code reported when a validator fails on an item instead of producing results.
pub const EXCEPTION_ERROR_CODE: &str = "EX100";

/// Build the graph over the whole content root.
///
/// The selected items replace their on-disk counterparts so the graph sees
/// the same documents the validators do.
pub fn build_graph(run: &RunContext, loader: &mut ContentLoader, selected: &[Artifact]) -> ContentGraph {
    let mut all: Vec<Artifact> = selected.to_vec();
    if run.mode != super::context::ExecutionMode::AllFiles {
        let known: HashSet<&Path> = selected.iter().map(|i| i.path.as_path()).collect();
        let mut extra = Vec::new();
        for path in loader.discover(&run.content_root) {
            if known.contains(path.as_path()) {
                continue;
            }
            match loader.load(&path) {
                Ok(item) => extra.push(item),
                Err(err) => debug!("Graph skips {}: {}", path.display(), err),
            }
        }
        all.extend(extra);
    }
    let graph = ContentGraph::build(&all);
    info!(
        "Content graph: {} node(s), {} edge(s)",
        graph.node_count(),
        graph.edge_count()
    );
    graph
}

/// Runs validators and fixes.
pub struct ValidateEngine<'r> {
    registry: &'r ValidatorRegistry,
}

impl<'r> ValidateEngine<'r> {
    pub fn new(registry: &'r ValidatorRegistry) -> Self {
        Self { registry }
    }

    pub fn run(&self, run: &RunContext, selection: Selection, graph: &ContentGraph) -> Result<RunReport> {
        let Selection { items, errors } = selection;
        let ctx = ValidationContext::new(run, graph, &items);
        let by_path: HashMap<&Path, &Artifact> =
            items.iter().map(|i| (i.path.as_path(), i)).collect();

        let mut collector = ResultCollector::new();
        collector.extend(errors);

        let validators: Vec<&dyn Validator> = self.registry.enabled(run).collect();
        // (validator index, result index) of fixable results, in validator order
        let mut fixables: Vec<(usize, usize)> = Vec::new();
        let mut cancelled = false;

        for (index, validator) in validators.iter().enumerate() {
            if run.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let info = validator.info();
            let applicable: Vec<&Artifact> =
                items.iter().filter(|item| should_run(&info, item, run)).collect();
            if applicable.is_empty() {
                continue;
            }
            debug!("{} on {} item(s)", info.code, applicable.len());

            let results = match validator.obtain_invalid_content_items(&applicable, &ctx) {
                Ok(results) => results,
                Err(err) => {
                    warn!("{} failed, retrying item by item: {}", info.code, err);
                    let (results, stopped) = retry_per_item(*validator, &applicable, &ctx);
                    cancelled |= stopped;
                    results
                }
            };

            for mut result in results {
                if let Some(item) = by_path.get(result.item_path.as_path()) {
                    if result.code == info.code && run.is_ignored(&result.code, item) {
                        continue;
                    }
                }
                if run.warning.contains(&result.code) {
                    result.severity = Severity::Warning;
                }
                let fixable = info.auto_fixable && result.fix_available;
                if collector.push(result) && fixable {
                    fixables.push((index, collector.len() - 1));
                }
            }
            if cancelled {
                break;
            }
        }

        let mut written = Vec::new();
        if run.fix && !cancelled && !fixables.is_empty() {
            written = apply_fixes(&validators, &items, &ctx, &mut collector, &fixables);
        } else if cancelled {
            info!("Run cancelled; partial results kept, no fixes applied");
        }

        Ok(RunReport {
            results: collector.into_sorted(),
            cancelled,
            written,
        })
    }
}

/// Re-run a failed validator on one item at a time, turning each failure into `EX100`.
fn retry_per_item(
    validator: &dyn Validator,
    items: &[&Artifact],
    ctx: &ValidationContext<'_>,
) -> (Vec<ValidationResult>, bool) {
    let mut results = Vec::new();
    for item in items {
        if ctx.run.cancel.is_cancelled() {
            return (results, true);
        }
        match validator.obtain_invalid_content_items(&[*item], ctx) {
            Ok(found) => results.extend(found),
            Err(err) => results.push(ValidationResult::new(
                EXCEPTION_ERROR_CODE,
                format!("{} could not validate this item: {}", validator.code(), err),
                item,
            )),
        }
    }
    (results, false)
}

/// Apply every pending fix, one artifact at a time, and write changed files.
fn apply_fixes(
    validators: &[&dyn Validator],
    items: &[Artifact],
    ctx: &ValidationContext<'_>,
    collector: &mut ResultCollector,
    fixables: &[(usize, usize)],
) -> Vec<PathBuf> {
    let mut by_item: BTreeMap<PathBuf, Vec<(usize, usize)>> = BTreeMap::new();
    for &(validator, result) in fixables {
        if let Some(found) = collector.get(result) {
            by_item
                .entry(found.item_path.clone())
                .or_default()
                .push((validator, result));
        }
    }

    let mut written = Vec::new();
    for item in items {
        if ctx.run.cancel.is_cancelled() {
            info!("Fix pass cancelled");
            break;
        }
        let Some(pending) = by_item.get(&item.path) else {
            continue;
        };

        let mut working = item.clone();
        let mut outcomes: HashMap<usize, FixOutcome> = HashMap::new();
        for &(validator_index, result_index) in pending {
            let outcome = match outcomes.get(&validator_index) {
                Some(outcome) => outcome.clone(),
                None => {
                    let validator = validators[validator_index];
                    let snapshot = working.data.clone();
                    let outcome = match validator.fix(&mut working, ctx) {
                        Ok(fixed) => FixOutcome::Applied(fixed.message),
                        Err(err) => {
                            debug!("{} fix unavailable for {}: {}", validator.code(), item.path.display(), err);
                            working.data = snapshot;
                            FixOutcome::Unavailable(err.to_string())
                        }
                    };
                    outcomes.insert(validator_index, outcome.clone());
                    outcome
                }
            };
            if let Some(result) = collector.get_mut(result_index) {
                result.fix_outcome = Some(outcome);
            }
        }

        match codec::write_if_changed(&item.path, &item.data, &working.data, item.format) {
            Ok(true) => {
                info!("Fixed {}", item.path.display());
                written.push(item.path.clone());
            }
            Ok(false) => {}
            Err(err) => {
                // Nothing after a failed write is attempted; earlier files stay written.
                warn!("Could not write fixes to {}: {}", item.path.display(), err);
                for &(_, result_index) in pending {
                    if let Some(result) = collector.get_mut(result_index) {
                        result.fix_outcome = Some(FixOutcome::Unavailable(format!("write failed: {}", err)));
                    }
                }
                collector.push(ValidationResult::for_path(
                    EXCEPTION_ERROR_CODE,
                    format!("Could not write fixes: {}", err),
                    &item.path,
                ));
                break;
            }
        }
    }
    written
}
