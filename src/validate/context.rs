//! Run-wide state threaded through selection, validation, fix and emission.
//!
//! [`RunContext`] is built once per run and never mutated afterwards. It
//! folds together what the run was asked to do (mode, code filters,
//! support-tier overrides) and the per-pack ignore files, loaded once.

use super::ignore::PackIgnore;
use crate::config::ValidateConfig;
use crate::content::{Artifact, Support};
use crate::format::SharedResolver;
use crate::graph::ContentGraph;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How the input set was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    AllFiles,
    SpecificFiles,
    UseGit,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::AllFiles => write!(f, "all files"),
            ExecutionMode::SpecificFiles => write!(f, "specific files"),
            ExecutionMode::UseGit => write!(f, "git changes"),
        }
    }
}

/// Cooperative cancellation flag, checked between validators.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Whether both tokens cancel together.
    pub fn same_as(&self, other: &CancellationToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Immutable configuration of one validate run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub content_root: PathBuf,
    pub mode: ExecutionMode,
    /// Only these codes run when non-empty.
    pub select: BTreeSet<String>,
    pub ignore: BTreeSet<String>,
    /// Codes reported as warnings.
    pub warning: BTreeSet<String>,
    pub support_ignores: BTreeMap<Support, BTreeSet<String>>,
    pub core_packs: Vec<String>,
    pub run_on_deprecated: bool,
    pub fix: bool,
    /// Whether release notes use `##` rather than `####` for first-level headers.
    pub force_rn_headers: bool,
    pub base_ref: Option<String>,
    pub cancel: CancellationToken,
    /// Registry lookups for docker tag rules; those rules stay silent without one.
    pub docker: Option<SharedResolver>,
    pack_ignores: BTreeMap<PathBuf, PackIgnore>,
}

impl RunContext {
    pub fn new(content_root: impl Into<PathBuf>, mode: ExecutionMode) -> Self {
        Self {
            content_root: content_root.into(),
            mode,
            select: BTreeSet::new(),
            ignore: BTreeSet::new(),
            warning: BTreeSet::new(),
            support_ignores: BTreeMap::new(),
            core_packs: crate::config::default_core_packs(),
            run_on_deprecated: false,
            fix: false,
            force_rn_headers: false,
            base_ref: None,
            cancel: CancellationToken::new(),
            docker: None,
            pack_ignores: BTreeMap::new(),
        }
    }

    /// Apply the `validate:` section of the project config.
    pub fn with_config(mut self, config: &ValidateConfig) -> Self {
        self.select.extend(config.select.iter().cloned());
        self.ignore.extend(config.ignore.iter().cloned());
        self.warning.extend(config.warning.iter().cloned());
        for (tier, overrides) in &config.support_level {
            if let Some(support) = Support::parse(tier) {
                self.support_ignores
                    .entry(support)
                    .or_default()
                    .extend(overrides.ignore.iter().cloned());
            }
        }
        self.run_on_deprecated |= config.run_on_deprecated;
        self.force_rn_headers |= config.force_rn_headers;
        self
    }

    pub fn with_core_packs(mut self, core_packs: Vec<String>) -> Self {
        self.core_packs = core_packs;
        self
    }

    pub fn with_fix(mut self, fix: bool) -> Self {
        self.fix = fix;
        self
    }

    pub fn with_base_ref(mut self, base_ref: impl Into<String>) -> Self {
        self.base_ref = Some(base_ref.into());
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_docker_resolver(mut self, resolver: SharedResolver) -> Self {
        self.docker = Some(resolver);
        self
    }

    /// Load the `.pack-ignore` of every pack the items belong to.
    pub fn with_pack_ignores<'a>(mut self, items: impl IntoIterator<Item = &'a Artifact>) -> Self {
        for item in items {
            let Some(pack) = &item.pack else { continue };
            if self.pack_ignores.contains_key(&pack.path) {
                continue;
            }
            let ignore = PackIgnore::load(&pack.path.join(".pack-ignore"));
            self.pack_ignores.insert(pack.path.clone(), ignore);
        }
        self
    }

    /// Whether a code is enabled by the select/ignore sets.
    pub fn code_enabled(&self, code: &str) -> bool {
        (self.select.is_empty() || self.select.contains(code)) && !self.ignore.contains(code)
    }

    /// Whether the pack ignore file or the item's support tier masks `code` for `item`.
    pub fn is_ignored(&self, code: &str, item: &Artifact) -> bool {
        if self
            .support_ignores
            .get(&item.support())
            .is_some_and(|codes| codes.contains(code))
        {
            return true;
        }
        let Some(pack) = &item.pack else {
            return false;
        };
        self.pack_ignores
            .get(&pack.path)
            .is_some_and(|ignore| ignore.ignores(code, &item.path))
    }

    /// Path relative to the content root, for display.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.content_root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// What a validator sees besides its own items.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub run: &'a RunContext,
    pub graph: &'a ContentGraph,
    /// Every item selected for this run.
    pub selected: &'a [Artifact],
}

impl<'a> ValidationContext<'a> {
    pub fn new(run: &'a RunContext, graph: &'a ContentGraph, selected: &'a [Artifact]) -> Self {
        Self {
            run,
            graph,
            selected,
        }
    }
}
