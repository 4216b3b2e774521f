//! Combines the repository index and the base directory into one listing.

use crate::config::Config;
use crate::discovery::Discoverer;
use crate::entry::{LazyEntry, Located, WorktreeEntry};
use crate::error::Result;
use crate::repo_index::{RepositoryIndex, discover_indexed, discover_indexed_lazy};
use std::collections::HashSet;
use std::path::PathBuf;

/// Concatenate per-source results, keeping the first entry seen for each path.
///
/// A failed source is reported and contributes nothing.
pub(crate) fn merge_unique<T: Located>(sources: Vec<(&'static str, Result<Vec<T>>)>) -> Vec<T> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut merged = Vec::new();
    for (source, result) in sources {
        let entries = match result {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("failed to discover {source} worktrees: {err}");
                continue;
            }
        };
        for entry in entries {
            if seen.insert(entry.path().to_path_buf()) {
                merged.push(entry);
            }
        }
    }
    merged
}

/// Index entries first (when enabled), then the base directory (when configured).
pub(crate) fn discover_all(
    config: &Config,
    discoverer: &Discoverer,
    index: &dyn RepositoryIndex,
) -> Vec<WorktreeEntry> {
    let mut sources = Vec::new();
    if config.ghq.enabled {
        sources.push((
            "ghq",
            discover_indexed(index, &config.ghq.worktrees_dir, discoverer),
        ));
    }
    if !config.worktree.base_dir.is_empty() {
        sources.push(("basedir", discoverer.discover(&config.worktree.base_dir)));
    }
    merge_unique(sources)
}

pub(crate) fn discover_all_lazy(
    config: &Config,
    discoverer: &Discoverer,
    index: &dyn RepositoryIndex,
) -> Vec<LazyEntry> {
    let mut sources = Vec::new();
    if config.ghq.enabled {
        sources.push((
            "ghq",
            discover_indexed_lazy(index, &config.ghq.worktrees_dir, discoverer),
        ));
    }
    if !config.worktree.base_dir.is_empty() {
        sources.push((
            "basedir",
            discoverer.discover_lazy(&config.worktree.base_dir),
        ));
    }
    merge_unique(sources)
}

/// With the index enabled, every source is best effort. Without it, the base
/// directory is the only source and its errors reach the caller. An empty base
/// directory disables that source and yields no entries.
pub(crate) fn discover_configured(
    config: &Config,
    discoverer: &Discoverer,
    index: &dyn RepositoryIndex,
) -> Result<Vec<WorktreeEntry>> {
    if config.ghq.enabled {
        return Ok(discover_all(config, discoverer, index));
    }
    if config.worktree.base_dir.is_empty() {
        return Ok(Vec::new());
    }
    discoverer.discover(&config.worktree.base_dir)
}

pub(crate) fn discover_configured_lazy(
    config: &Config,
    discoverer: &Discoverer,
    index: &dyn RepositoryIndex,
) -> Result<Vec<LazyEntry>> {
    if config.ghq.enabled {
        return Ok(discover_all_lazy(config, discoverer, index));
    }
    if config.worktree.base_dir.is_empty() {
        return Ok(Vec::new());
    }
    discoverer.discover_lazy(&config.worktree.base_dir)
}
