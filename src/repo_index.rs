//! Discovery over repositories listed by an external index (`ghq`).
//!
//! Every indexed repository contributes its primary checkout plus the linked
//! worktrees kept directly under `<repo>/<worktrees_dir>/`.

use crate::classify::has_gitdir_pointer;
use crate::constants::{DEFAULT_INDEX_WORKTREES_DIR, GIT_DIR_NAME, INDEX_BIN};
use crate::discovery::Discoverer;
use crate::entry::{LazyEntry, WorktreeEntry};
use crate::error::{DiscoveryError, Result, warn_unless_not_found};
use crate::git::ensure_main_repository;
use crate::paths::{relative_to_first_root, validate_worktrees_dir};
use crate::pool::run_pool;
use crate::process::{best_error_line, output_lines, run_capture};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub(crate) trait RepositoryIndex: Send + Sync {
    fn is_installed(&self) -> bool;
    /// Every configured root; repositories live somewhere below one of them.
    fn roots(&self) -> Result<Vec<PathBuf>>;
    /// Absolute paths of all indexed repositories.
    fn repositories(&self) -> Result<Vec<PathBuf>>;
}

pub(crate) struct GhqCli;

impl GhqCli {
    fn lines(&self, args: &[&str]) -> Result<Vec<String>> {
        let output = run_capture(INDEX_BIN, args, None)
            .map_err(|err| DiscoveryError::Index(format!("{err:#}")))?;
        if !output.status.success() {
            return Err(DiscoveryError::Index(format!(
                "`{INDEX_BIN} {}` failed: {}",
                args.join(" "),
                best_error_line(&output.stderr)
            )));
        }
        Ok(output_lines(&output.stdout))
    }
}

impl RepositoryIndex for GhqCli {
    fn is_installed(&self) -> bool {
        self.lines(&["root"]).is_ok()
    }

    fn roots(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .lines(&["root", "--all"])?
            .into_iter()
            .map(PathBuf::from)
            .collect())
    }

    fn repositories(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .lines(&["list", "-p"])?
            .into_iter()
            .map(PathBuf::from)
            .collect())
    }
}

/// What every repository of one index run shares.
struct IndexScan {
    roots: Vec<PathBuf>,
    worktrees_dir: Option<String>,
    repositories: Vec<PathBuf>,
}

impl IndexScan {
    fn load(index: &dyn RepositoryIndex, worktrees_dir: &str) -> Result<Self> {
        if !index.is_installed() {
            return Err(DiscoveryError::Index(format!("{INDEX_BIN} is not installed")));
        }
        let repositories = index.repositories()?;
        let roots = index.roots().unwrap_or_else(|err| {
            log::debug!("continuing without index roots: {err}");
            Vec::new()
        });

        let worktrees_dir = if worktrees_dir.trim().is_empty() {
            DEFAULT_INDEX_WORKTREES_DIR
        } else {
            worktrees_dir
        };
        let worktrees_dir = match validate_worktrees_dir(worktrees_dir) {
            Ok(()) => Some(worktrees_dir.to_string()),
            Err(err) => {
                log::warn!("{err}; skipping nested worktrees");
                None
            }
        };

        Ok(Self {
            roots,
            worktrees_dir,
            repositories,
        })
    }

    fn main_display_path(&self, repo: &Path) -> Option<String> {
        relative_to_first_root(repo, &self.roots)
    }

    /// Linked worktrees directly under the repository's worktrees directory, sorted.
    fn nested_worktrees(&self, repo: &Path) -> Vec<PathBuf> {
        let Some(worktrees_dir) = self.worktrees_dir.as_deref() else {
            return Vec::new();
        };
        let dir = repo.join(worktrees_dir);
        let read = match fs::read_dir(&dir) {
            Ok(read) => read,
            Err(err) => {
                let err = DiscoveryError::io(&dir, err);
                warn_unless_not_found("failed to discover worktrees in", &dir, &err);
                return Vec::new();
            }
        };

        let mut nested: Vec<PathBuf> = read
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_dir()))
            .map(|entry| entry.path())
            .filter(|path| has_gitdir_pointer(&path.join(GIT_DIR_NAME)))
            .collect();
        nested.sort();
        nested
    }
}

fn nested_display_path(main_label: &str, worktree: &Path) -> String {
    let dir_name = file_name(worktree);
    if main_label.is_empty() {
        return dir_name;
    }
    format!("{main_label}:{dir_name}")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The primary's display path, else `host/owner/repo` of its remote, else its directory name.
fn main_label(main: &WorktreeEntry) -> String {
    if let Some(display) = main.display_path.as_deref()
        && !display.is_empty()
    {
        return display.to_string();
    }
    if let Some(info) = &main.repository_info
        && !info.full_path.is_empty()
    {
        return info.full_path.clone();
    }
    file_name(&main.path)
}

/// Primary checkouts and nested worktrees of every indexed repository.
///
/// Fails only when the index itself is unusable; per-repository failures are
/// logged and skipped.
pub(crate) fn discover_indexed(
    index: &dyn RepositoryIndex,
    worktrees_dir: &str,
    discoverer: &Discoverer,
) -> Result<Vec<WorktreeEntry>> {
    let scan = IndexScan::load(index, worktrees_dir)?;
    let extractor = discoverer.extractor().as_ref();

    let per_repo = run_pool(&scan.repositories, discoverer.workers(), |repo| {
        let details = match extractor.main_repository(repo) {
            Ok(details) => details,
            Err(err) => {
                warn_unless_not_found("failed to extract main repo info from", repo, &err);
                return None;
            }
        };
        let mut main = WorktreeEntry::from_details(repo.clone(), true, details);
        main.display_path = scan.main_display_path(repo);
        let label = main_label(&main);

        let mut entries = vec![main];
        for path in scan.nested_worktrees(repo) {
            match extractor.worktree(&path) {
                Ok(details) => {
                    let mut entry = WorktreeEntry::from_details(path, false, details);
                    entry.display_path = Some(nested_display_path(&label, &entry.path));
                    entries.push(entry);
                }
                Err(err) => {
                    warn_unless_not_found("failed to extract worktree info from", &path, &err)
                }
            }
        }
        Some(entries)
    });

    Ok(per_repo.into_iter().flatten().collect())
}

/// Same shape as [`discover_indexed`] without reading any details.
///
/// Nested labels fall back to the repository directory name when the primary has
/// no display path, since the remote is not known yet.
pub(crate) fn discover_indexed_lazy(
    index: &dyn RepositoryIndex,
    worktrees_dir: &str,
    discoverer: &Discoverer,
) -> Result<Vec<LazyEntry>> {
    let scan = IndexScan::load(index, worktrees_dir)?;
    let extractor = discoverer.extractor();

    let mut entries = Vec::new();
    for repo in &scan.repositories {
        if let Err(err) = ensure_main_repository(repo) {
            warn_unless_not_found("failed to extract main repo info from", repo, &err);
            continue;
        }
        let display = scan.main_display_path(repo);
        let label = display.clone().unwrap_or_else(|| file_name(repo));
        entries.push(
            LazyEntry::new(repo.clone(), true, Arc::clone(extractor)).with_display_path(display),
        );

        for path in scan.nested_worktrees(repo) {
            let display = nested_display_path(&label, &path);
            entries.push(
                LazyEntry::new(path, false, Arc::clone(extractor))
                    .with_display_path(Some(display)),
            );
        }
    }
    Ok(entries)
}
