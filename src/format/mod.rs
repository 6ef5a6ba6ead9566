//! Content formatting.
//!
//! [`Formatter`] loads each requested item, runs the shared base steps and
//! the steps of its content type, and writes the document back only when
//! its data changed. READMEs are formatted as plain markdown.
//!
//! The same [`primitives`] back the validator fixes, so a formatted item
//! passes the checks those fixes address.

pub mod docker;
pub mod integration;
pub mod json_generic;
pub mod playbook;
pub mod primitives;
pub mod readme;
pub mod schema;
pub mod script;

pub use docker::{DockerHubResolver, DockerResolver, SharedResolver};

use crate::codec::{self, DocumentFormat};
use crate::content::{Artifact, ContentLoader, ContentType};
use crate::error::{PacklintError, Result};
use crate::git::GitProvider;
use crate::graph::ContentGraph;
use crate::ui::{Prompt, PromptType, UserInterface};
use crate::validate::{build_graph, select, ExecutionMode, RunContext, SelectionInput};
use primitives::{
    remove_copy_and_dev_suffixes, remove_nativeimage, remove_spaces_end_of_id_and_name,
    set_fromversion, set_version_to_default,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

const README: &str = "README.md";

/// What `format` was asked to do.
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    /// Write the result here instead of in place (single input only).
    pub output: Option<PathBuf>,
    /// Raise `fromversion` to at least this version.
    pub from_version: Option<String>,
    /// Answer every prompt with its automatic choice.
    pub assume_yes: bool,
    pub update_docker: bool,
}

/// One formatted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedFile {
    /// Where the result went.
    pub path: PathBuf,
    pub written: bool,
    /// Descriptions of the steps that changed something.
    pub steps: Vec<String>,
}

/// Outcome of a format run.
#[derive(Debug, Default)]
pub struct FormatReport {
    pub files: Vec<FormattedFile>,
    /// Files that could not be loaded, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

impl FormatReport {
    pub fn written(&self) -> impl Iterator<Item = &FormattedFile> {
        self.files.iter().filter(|f| f.written)
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the format pipeline over a set of paths.
pub struct Formatter<'a> {
    root: PathBuf,
    options: FormatOptions,
    resolver: Option<&'a dyn DockerResolver>,
    git: Option<(Arc<dyn GitProvider>, String)>,
}

impl<'a> Formatter<'a> {
    pub fn new(root: impl Into<PathBuf>, options: FormatOptions) -> Self {
        Self {
            root: root.into(),
            options,
            resolver: None,
            git: None,
        }
    }

    /// Resolver used when `update_docker` is set.
    pub fn with_docker_resolver(mut self, resolver: &'a dyn DockerResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Load each item's base version from `base_ref`.
    pub fn with_git(mut self, provider: Arc<dyn GitProvider>, base_ref: impl Into<String>) -> Self {
        self.git = Some((provider, base_ref.into()));
        self
    }

    /// Format every item and README under `paths`.
    pub fn run(&self, paths: &[PathBuf], ui: &mut dyn UserInterface) -> Result<FormatReport> {
        let (readmes, content): (Vec<PathBuf>, Vec<PathBuf>) = expand_readmes(&self.root, paths)
            .into_iter()
            .partition(|p| is_readme(p));

        let mut loader = ContentLoader::new();
        let selection = select(&self.root, &SelectionInput::Paths(content), &mut loader)?;
        let mut items = selection.items;
        let mut report = FormatReport {
            failures: selection
                .errors
                .into_iter()
                .map(|e| (e.path, e.message))
                .collect(),
            ..Default::default()
        };

        if self.options.output.is_some() && items.len() + readmes.len() != 1 {
            return Err(PacklintError::Other(anyhow::anyhow!(
                "--output needs exactly one input file, got {}",
                items.len() + readmes.len()
            )));
        }

        if let Some((provider, base_ref)) = &self.git {
            for item in &mut items {
                item.old_base = self.load_base(&mut loader, item, provider, base_ref).map(Box::new);
            }
        }

        let graph = items
            .iter()
            .any(|i| i.content_type == ContentType::IncidentField && i.data.get("Aliases").is_some())
            .then(|| {
                let run = RunContext::new(&self.root, ExecutionMode::SpecificFiles);
                build_graph(&run, &mut loader, &items)
            });

        for mut item in items {
            let original = item.data.clone();
            let steps = self.format_item(&mut item, ui)?;
            let file = self.write(&item.path, &original, &item.data, item.format, steps)?;
            report.files.push(file);
            if let Some(graph) = &graph {
                report.files.extend(self.update_aliases(&item, graph)?);
            }
        }

        for path in readmes {
            let file = self.format_readme(&path, ui)?;
            report.files.push(file);
        }

        info!(
            "Formatted {} file(s), {} written",
            report.files.len(),
            report.written().count()
        );
        Ok(report)
    }

    fn load_base(
        &self,
        loader: &mut ContentLoader,
        item: &Artifact,
        provider: &Arc<dyn GitProvider>,
        base_ref: &str,
    ) -> Option<Artifact> {
        let bytes = provider
            .read_at(base_ref, &item.path)
            .map_err(|e| debug!("No base version of {}: {}", item.path.display(), e))
            .ok()?;
        loader
            .load_from_text(&item.path, &String::from_utf8_lossy(&bytes), item.format)
            .map_err(|e| debug!("Base version of {} does not load: {}", item.path.display(), e))
            .ok()
    }

    /// Apply the base steps and the steps of the item's type.
    pub fn format_item(&self, item: &mut Artifact, ui: &mut dyn UserInterface) -> Result<Vec<String>> {
        let mut steps: Vec<&'static str> = Vec::new();
        if item.format == DocumentFormat::Markdown {
            return Ok(Vec::new());
        }

        if item.format == DocumentFormat::Json {
            steps.extend(json_generic::format_json(item));
        }
        if remove_copy_and_dev_suffixes(&mut item.data) {
            steps.push("removed _copy/_dev from name");
        }
        if remove_spaces_end_of_id_and_name(item) {
            steps.push("trimmed id and name");
        }
        if remove_nativeimage(item) {
            steps.push("removed nativeimage");
        }
        if item.content_type.has_version_marker() {
            if set_version_to_default(item) {
                steps.push("set version to -1");
            }
            if set_fromversion(item, self.options.from_version.as_deref()) {
                steps.push("set fromversion");
            }
        }
        if let Some(schema) = schema::schema_for(item.content_type)? {
            let removed = schema.remove_unnecessary_keys(&mut item.data);
            if !removed.is_empty() {
                debug!("Removed {} from {}", removed.join(", "), item.path.display());
                steps.push("removed keys the schema does not allow");
            }
        }

        match item.content_type {
            ContentType::Integration => steps.extend(integration::format_integration(item)),
            ContentType::Script => steps.extend(script::format_script(item)),
            ContentType::Playbook | ContentType::TestPlaybook => {
                steps.extend(playbook::format_playbook(item));
                if self.ensure_playbook_description(item, ui)? {
                    steps.push("added playbook description");
                }
            }
            _ => {}
        }

        let mut steps: Vec<String> = steps.into_iter().map(str::to_string).collect();
        if self.options.update_docker {
            if let Some(resolver) = self.resolver {
                if let Some(image) = docker::update_docker_image(item, resolver) {
                    steps.push(format!("updated docker image to {}", image));
                }
            }
        }
        Ok(steps)
    }

    fn ensure_playbook_description(&self, item: &mut Artifact, ui: &mut dyn UserInterface) -> Result<bool> {
        let Some(object) = item.data.as_object_mut() else {
            return Ok(false);
        };
        if object.contains_key("description") {
            return Ok(false);
        }
        let description = if self.options.assume_yes {
            String::new()
        } else {
            ui.prompt(&Prompt {
                key: "playbook_description".to_string(),
                question: format!("Description for playbook {}", item.path.display()),
                prompt_type: PromptType::Input,
                default: Some(String::new()),
            })?
            .as_string()
        };
        object.insert("description".into(), Value::String(description));
        Ok(true)
    }

    fn update_aliases(&self, item: &Artifact, graph: &ContentGraph) -> Result<Vec<FormattedFile>> {
        Ok(json_generic::update_alias_marketplaces(item, graph)?
            .into_iter()
            .map(|path| FormattedFile {
                path,
                written: true,
                steps: vec!["restricted alias field to xsoar".to_string()],
            })
            .collect())
    }

    fn format_readme(&self, path: &Path, ui: &mut dyn UserInterface) -> Result<FormattedFile> {
        let text = std::fs::read_to_string(path)?;
        let (fixed, count) = readme::fix_relative_links(&text, ui, self.options.assume_yes)?;
        let steps = if count > 0 {
            vec![format!("added https:// to {} link(s)", count)]
        } else {
            Vec::new()
        };
        self.write(
            path,
            &Value::String(text),
            &Value::String(fixed),
            DocumentFormat::Markdown,
            steps,
        )
    }

    fn write(
        &self,
        path: &Path,
        original: &Value,
        data: &Value,
        format: DocumentFormat,
        steps: Vec<String>,
    ) -> Result<FormattedFile> {
        let (target, written) = match &self.options.output {
            Some(output) => {
                if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(output, codec::dump(data, format)?)?;
                (output.clone(), true)
            }
            None => (path.to_path_buf(), codec::write_if_changed(path, original, data, format)?),
        };
        Ok(FormattedFile {
            path: target,
            written,
            steps,
        })
    }
}

fn is_readme(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == README)
}

/// Input paths, with every README under an input directory added.
fn expand_readmes(root: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut expanded = Vec::new();
    for path in paths {
        let path = if path.is_absolute() {
            path.clone()
        } else {
            root.join(path)
        };
        if path.is_dir() {
            expanded.extend(
                WalkDir::new(&path)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file() && is_readme(e.path()))
                    .map(|e| e.into_path()),
            );
        }
        expanded.push(path);
    }
    expanded.sort();
    expanded.dedup();
    expanded
}
