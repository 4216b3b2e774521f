use crate::constants::{
    DEFAULT_REMOTE, DETACHED_BRANCH, GIT_BIN, GIT_DIR_NAME, UNKNOWN_BRANCH,
};
use crate::entry::WorktreeDetails;
use crate::error::{DiscoveryError, Result};
use crate::extract::{DetailSource, Probe};
use crate::process::{best_error_line, run_capture};
use crate::remote_url::parse_repository_url;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// The three questions the fallback path asks the `git` binary.
pub(crate) trait GitRunner: Send + Sync {
    fn current_branch(&self, path: &Path) -> Result<String>;
    fn current_commit(&self, path: &Path) -> Result<String>;
    fn remote_url(&self, path: &Path) -> Result<String>;
}

pub(crate) struct GitCli;

impl GitCli {
    fn output(&self, path: &Path, args: &[&str]) -> Result<String> {
        let output = run_capture(GIT_BIN, args, Some(path)).map_err(|err| {
            if !path.exists() {
                return DiscoveryError::NotFound(path.to_path_buf());
            }
            DiscoveryError::Git {
                path: path.to_path_buf(),
                message: format!("{err:#}"),
            }
        })?;
        if !output.status.success() {
            return Err(DiscoveryError::Git {
                path: path.to_path_buf(),
                message: best_error_line(&output.stderr),
            });
        }
        Ok(output.stdout.trim().to_string())
    }
}

impl GitRunner for GitCli {
    fn current_branch(&self, path: &Path) -> Result<String> {
        self.output(path, &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn current_commit(&self, path: &Path) -> Result<String> {
        self.output(path, &["rev-parse", "HEAD"])
    }

    fn remote_url(&self, path: &Path) -> Result<String> {
        let key = format!("remote.{DEFAULT_REMOTE}.url");
        self.output(path, &["config", "--get", &key])
    }
}

/// Authoritative but slower: asks `git` for everything.
pub(crate) struct GitFallback {
    runner: Arc<dyn GitRunner>,
}

impl GitFallback {
    pub(crate) fn new(runner: Arc<dyn GitRunner>) -> Self {
        Self { runner }
    }
}

impl DetailSource for GitFallback {
    fn name(&self) -> &'static str {
        "git"
    }

    fn probe(&self, worktree: &Path) -> Probe {
        match read_with_git(self.runner.as_ref(), worktree) {
            Ok(details) => Probe::Found(details),
            Err(err) => Probe::Failed(err),
        }
    }
}

fn read_with_git(runner: &dyn GitRunner, worktree: &Path) -> Result<WorktreeDetails> {
    let repository_url = runner.remote_url(worktree).unwrap_or_default();
    let repository_info = parse_repository_url(&repository_url);
    let branch = runner.current_branch(worktree)?;
    let commit_hash = runner.current_commit(worktree)?;
    Ok(WorktreeDetails {
        repository_url,
        repository_info,
        branch: normalize_branch(branch),
        commit_hash,
    })
}

fn normalize_branch(branch: String) -> String {
    if branch.is_empty() {
        DETACHED_BRANCH.to_string()
    } else {
        branch
    }
}

/// Details of a primary checkout, which must own a real `.git` directory.
///
/// A missing `.git` maps to [`DiscoveryError::NotFound`]; a `.git` file means the
/// path is a linked worktree and is rejected. Branch and commit failures degrade to
/// `"unknown"` and an empty hash instead of failing the entry.
pub(crate) fn read_main_repository(runner: &dyn GitRunner, repo: &Path) -> Result<WorktreeDetails> {
    ensure_main_repository(repo)?;

    let repository_url = runner.remote_url(repo).unwrap_or_default();
    let repository_info = parse_repository_url(&repository_url);
    let branch = runner
        .current_branch(repo)
        .ok()
        .filter(|branch| !branch.is_empty())
        .unwrap_or_else(|| UNKNOWN_BRANCH.to_string());
    let commit_hash = runner.current_commit(repo).unwrap_or_default();

    Ok(WorktreeDetails {
        repository_url,
        repository_info,
        branch,
        commit_hash,
    })
}

/// A primary checkout owns a `.git` directory; a `.git` file marks a linked worktree.
pub(crate) fn ensure_main_repository(repo: &Path) -> Result<()> {
    let git_dir = repo.join(GIT_DIR_NAME);
    let metadata = fs::metadata(&git_dir).map_err(|err| DiscoveryError::io(&git_dir, err))?;
    if !metadata.is_dir() {
        return Err(DiscoveryError::NotMainRepository(repo.to_path_buf()));
    }
    Ok(())
}
