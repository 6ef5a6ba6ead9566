//! Input selection and per-validator applicability.
//!
//! Selection turns the run's inputs (the whole content root, an explicit path
//! list, or the git change set) into artifacts. Files that cannot be
//! classified become `CL100` results instead of aborting the run. A changed
//! related file (a README, an image, a code file) selects its owning item and
//! marks the related file as changed.

use super::context::{ExecutionMode, RunContext};
use super::results::ValidationResult;
use super::validator::ValidatorInfo;
use crate::codec::DocumentFormat;
use crate::content::loader::{is_primary_candidate, owner_of, pack_dir};
use crate::content::related::ReadSource;
use crate::content::{Artifact, ContentLoader, GitStatus, RelatedFileKind};
use crate::error::Result;
use crate::git::GitProvider;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Code reported for files the loader could not classify or parse.
pub const CLASSIFICATION_ERROR_CODE: &str = "CL100";

/// Where the input set comes from.
#[derive(Debug, Clone)]
pub enum SelectionInput {
    All,
    Paths(Vec<PathBuf>),
    Git {
        provider: Arc<dyn GitProvider>,
        base_ref: String,
    },
}

impl SelectionInput {
    pub fn mode(&self) -> ExecutionMode {
        match self {
            SelectionInput::All => ExecutionMode::AllFiles,
            SelectionInput::Paths(_) => ExecutionMode::SpecificFiles,
            SelectionInput::Git { .. } => ExecutionMode::UseGit,
        }
    }
}

/// Items chosen for a run, plus the files that failed to load.
#[derive(Debug, Default)]
pub struct Selection {
    pub items: Vec<Artifact>,
    pub errors: Vec<ValidationResult>,
}

/// One requested file, before loading.
#[derive(Debug, Default)]
struct Pending {
    status: Option<GitStatus>,
    old_path: Option<PathBuf>,
    changed_related: Vec<RelatedFileKind>,
}

/// Collects requested files and loads each owner once.
struct Selector<'l> {
    root: PathBuf,
    loader: &'l mut ContentLoader,
    pending: BTreeMap<PathBuf, Pending>,
    errors: Vec<ValidationResult>,
}

impl<'l> Selector<'l> {
    fn new(root: &Path, loader: &'l mut ContentLoader) -> Self {
        Self {
            root: root.to_path_buf(),
            loader,
            pending: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Queue `path` (a primary file, a related file or a directory).
    fn request(&mut self, path: &Path, status: Option<GitStatus>, old_path: Option<PathBuf>) {
        let path = self.absolute(path);

        if path.is_dir() {
            for file in self.loader.discover(&path) {
                self.pending.entry(file).or_default();
            }
            return;
        }

        if let Some((owner, kind)) = owner_of(&path) {
            debug!("{} selects its owner {}", path.display(), owner.display());
            let entry = self.pending.entry(owner).or_default();
            entry.changed_related.push(kind);
            if entry.status.is_none() && status.is_some() {
                entry.status = Some(GitStatus::Modified);
            }
            return;
        }

        if pack_dir(&path).is_none() || !is_primary_candidate(&path) {
            debug!("Skipping non-content file {}", path.display());
            return;
        }

        let entry = self.pending.entry(path).or_default();
        if status.is_some() {
            entry.status = status;
            entry.old_path = old_path.map(|p| self.root.join(p));
        }
    }

    fn finish(mut self, git: Option<(&Arc<dyn GitProvider>, &str)>) -> Selection {
        let pending = std::mem::take(&mut self.pending);
        let mut items = Vec::with_capacity(pending.len());

        for (path, request) in pending {
            let mut item = match self.loader.load(&path) {
                Ok(item) => item,
                Err(err) => {
                    self.errors.push(ValidationResult::for_path(
                        CLASSIFICATION_ERROR_CODE,
                        err.to_string(),
                        &path,
                    ));
                    continue;
                }
            };
            item.git_status = request.status;
            item.old_path = request.old_path;
            for kind in request.changed_related {
                if let Some(related) = item.related.get_mut(&kind) {
                    related.changed = true;
                }
            }

            if let Some((provider, base_ref)) = git {
                if matches!(item.git_status, Some(GitStatus::Modified | GitStatus::Renamed)) {
                    item.old_base = self.load_base(&item, provider, base_ref).map(Box::new);
                }
            }
            items.push(item);
        }

        Selection {
            items,
            errors: self.errors,
        }
    }

    /// The item as it appears on `base_ref`, if it can be read and classified.
    fn load_base(
        &mut self,
        item: &Artifact,
        provider: &Arc<dyn GitProvider>,
        base_ref: &str,
    ) -> Option<Artifact> {
        let base_path = item.old_path.as_deref().unwrap_or(&item.path);
        let bytes = match provider.read_at(base_ref, base_path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!("No base version of {}: {}", base_path.display(), err);
                return None;
            }
        };
        let format = DocumentFormat::from_path(base_path).unwrap_or(item.format);
        let text = String::from_utf8_lossy(&bytes);
        match self.loader.load_from_text(base_path, &text, format) {
            Ok(mut base) => {
                base.attach_related(ReadSource::GitRef {
                    provider: Arc::clone(provider),
                    git_ref: base_ref.to_string(),
                });
                Some(base)
            }
            Err(err) => {
                debug!("Base version of {} does not load: {}", base_path.display(), err);
                None
            }
        }
    }
}

/// Load the items the run should validate.
pub fn select(root: &Path, input: &SelectionInput, loader: &mut ContentLoader) -> Result<Selection> {
    let mut selector = Selector::new(root, loader);

    let selection = match input {
        SelectionInput::All => {
            for file in selector.loader.discover(root) {
                selector.pending.entry(file).or_default();
            }
            selector.finish(None)
        }
        SelectionInput::Paths(paths) => {
            for path in paths {
                selector.request(path, None, None);
            }
            selector.finish(None)
        }
        SelectionInput::Git { provider, base_ref } => {
            let changed = provider.changed_files(base_ref)?;
            for file in &changed {
                if file.status == GitStatus::Deleted {
                    debug!("Skipping deleted file {}", file.path.display());
                    continue;
                }
                selector.request(&file.path, Some(file.status), file.old_path.clone());
            }
            selector.finish(Some((provider, base_ref)))
        }
    };

    info!(
        "Selected {} item(s) ({}), {} failed to load",
        selection.items.len(),
        input.mode(),
        selection.errors.len()
    );
    Ok(selection)
}

/// Whether a validator should see `item` in this run.
pub fn should_run(info: &ValidatorInfo, item: &Artifact, run: &RunContext) -> bool {
    if !info.content_types.contains(&item.content_type) {
        return false;
    }
    if let Some(statuses) = info.git_statuses {
        if !item.git_status.is_some_and(|status| statuses.contains(&status)) {
            return false;
        }
    }
    if let Some(modes) = info.execution_modes {
        if !modes.contains(&run.mode) {
            return false;
        }
    }
    if !info.related_files.is_empty() {
        let relevant = info.related_files.iter().any(|kind| {
            item.related_file(*kind)
                .is_some_and(|related| related.changed || related.exist())
        });
        if !relevant {
            return false;
        }
    }
    if item.deprecated() && !info.run_on_deprecated && !run.run_on_deprecated {
        return false;
    }
    !run.is_ignored(info.code, item)
}
