//! Git change discovery.
//!
//! The validate engine only needs two things from git: the list of files
//! changed relative to a base ref, and the content of a file at a ref.
//! [`GitProvider`] is that seam; [`GitCli`] implements it by shelling out to
//! the `git` binary.

use crate::content::types::GitStatus;
use crate::error::{PacklintError, Result};
use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file reported as changed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    /// Path relative to the repository root.
    pub path: PathBuf,
    pub status: GitStatus,
    /// Previous path, for renames.
    pub old_path: Option<PathBuf>,
}

/// Read-only view of a git repository.
pub trait GitProvider: Send + Sync + std::fmt::Debug {
    /// Files changed between `base_ref` and the working tree.
    fn changed_files(&self, base_ref: &str) -> Result<Vec<ChangedFile>>;

    /// Raw content of `path` (relative to the repository root) at `git_ref`.
    fn read_at(&self, git_ref: &str, path: &Path) -> Result<Vec<u8>>;
}

/// [`GitProvider`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_root: PathBuf,
}

impl GitCli {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<Vec<u8>> {
        debug!("git {}", args.join(" "));
        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .context("Failed to run git")?;

        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(output.stdout)
    }
}

impl GitProvider for GitCli {
    fn changed_files(&self, base_ref: &str) -> Result<Vec<ChangedFile>> {
        let diff = self
            .run(&["diff", "--name-status", "-M", base_ref])
            .map_err(git_error)?;
        let mut files = parse_name_status(&String::from_utf8_lossy(&diff));

        let untracked = self
            .run(&["ls-files", "--others", "--exclude-standard"])
            .map_err(git_error)?;
        for line in String::from_utf8_lossy(&untracked).lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            files.push(ChangedFile {
                path: PathBuf::from(line),
                status: GitStatus::Added,
                old_path: None,
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);
        Ok(files)
    }

    fn read_at(&self, git_ref: &str, path: &Path) -> Result<Vec<u8>> {
        let relative = path.strip_prefix(&self.repo_root).unwrap_or(path);
        let spec = format!(
            "{}:{}",
            git_ref,
            relative.to_string_lossy().replace('\\', "/")
        );
        self.run(&["show", &spec]).map_err(git_error)
    }
}

fn git_error(err: anyhow::Error) -> PacklintError {
    PacklintError::Git {
        message: format!("{:#}", err),
    }
}

/// Parse `git diff --name-status` output.
///
/// Unknown status letters are skipped.
pub fn parse_name_status(output: &str) -> Vec<ChangedFile> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let status = GitStatus::from_letter(parts.next()?.trim())?;
            let first = parts.next()?.trim();
            match (status, parts.next()) {
                (GitStatus::Renamed, Some(new_path)) => Some(ChangedFile {
                    path: PathBuf::from(new_path.trim()),
                    status,
                    old_path: Some(PathBuf::from(first)),
                }),
                (GitStatus::Added, Some(new_path)) => Some(ChangedFile {
                    // copies report source then destination
                    path: PathBuf::from(new_path.trim()),
                    status,
                    old_path: None,
                }),
                _ => Some(ChangedFile {
                    path: PathBuf::from(first),
                    status,
                    old_path: None,
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Serialize git-process tests to avoid flaky failures under parallel execution
    static GIT_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn parses_basic_statuses() {
        let files = parse_name_status("M\tPacks/A/a.yml\nA\tPacks/A/b.yml\nD\tPacks/A/c.yml\n");
        assert_eq!(files.len(), 3);
        assert_eq!(files[0].status, GitStatus::Modified);
        assert_eq!(files[1].status, GitStatus::Added);
        assert_eq!(files[2].status, GitStatus::Deleted);
        assert_eq!(files[2].path, PathBuf::from("Packs/A/c.yml"));
    }

    #[test]
    fn parses_renames_with_old_path() {
        let files = parse_name_status("R093\tPacks/A/old.yml\tPacks/A/new.yml\n");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].status, GitStatus::Renamed);
        assert_eq!(files[0].path, PathBuf::from("Packs/A/new.yml"));
        assert_eq!(files[0].old_path, Some(PathBuf::from("Packs/A/old.yml")));
    }

    #[test]
    fn skips_unknown_and_blank_lines() {
        let files = parse_name_status("\nX\tfoo\nU\tbar\n");
        assert!(files.is_empty());
    }

    fn git(dir: &Path, args: &[&str]) -> bool {
        std::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn init_repo(dir: &Path) -> bool {
        git(dir, &["init", "--initial-branch=main"])
            && git(dir, &["config", "user.name", "Test"])
            && git(dir, &["config", "user.email", "test@test.com"])
    }

    #[test]
    fn reports_working_tree_changes_against_head() {
        let _lock = GIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = TempDir::new().unwrap();
        if !init_repo(temp.path()) {
            return;
        }
        std::fs::write(temp.path().join("kept.yml"), "id: a\n").unwrap();
        std::fs::write(temp.path().join("gone.yml"), "id: b\n").unwrap();
        assert!(git(temp.path(), &["add", "."]));
        assert!(git(temp.path(), &["commit", "-m", "init"]));

        std::fs::write(temp.path().join("kept.yml"), "id: a2\n").unwrap();
        std::fs::remove_file(temp.path().join("gone.yml")).unwrap();
        std::fs::write(temp.path().join("new.yml"), "id: c\n").unwrap();

        let provider = GitCli::new(temp.path());
        let files = provider.changed_files("HEAD").unwrap();
        let summary: Vec<_> = files
            .iter()
            .map(|f| (f.path.to_string_lossy().to_string(), f.status))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("gone.yml".to_string(), GitStatus::Deleted),
                ("kept.yml".to_string(), GitStatus::Modified),
                ("new.yml".to_string(), GitStatus::Added),
            ]
        );
    }

    #[test]
    fn reads_file_at_ref() {
        let _lock = GIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = TempDir::new().unwrap();
        if !init_repo(temp.path()) {
            return;
        }
        std::fs::write(temp.path().join("a.yml"), "id: old\n").unwrap();
        assert!(git(temp.path(), &["add", "."]));
        assert!(git(temp.path(), &["commit", "-m", "init"]));
        std::fs::write(temp.path().join("a.yml"), "id: new\n").unwrap();

        let provider = GitCli::new(temp.path());
        let bytes = provider
            .read_at("HEAD", &temp.path().join("a.yml"))
            .unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "id: old\n");
    }

    #[test]
    fn bad_ref_is_git_error() {
        let _lock = GIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = TempDir::new().unwrap();
        if !init_repo(temp.path()) {
            return;
        }
        let provider = GitCli::new(temp.path());
        let err = provider.changed_files("no-such-ref").unwrap_err();
        assert!(matches!(err, PacklintError::Git { .. }));
    }
}
