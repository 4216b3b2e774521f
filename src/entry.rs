use crate::error::{DiscoveryError, Result};
use crate::extract::Extractor;
use crate::remote_url::RepositoryInfo;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Facts read from a checkout's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct WorktreeDetails {
    pub(crate) repository_url: String,
    pub(crate) repository_info: Option<RepositoryInfo>,
    pub(crate) branch: String,
    pub(crate) commit_hash: String,
}

/// A fully extracted checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct WorktreeEntry {
    pub(crate) path: PathBuf,
    pub(crate) branch: String,
    pub(crate) commit_hash: String,
    pub(crate) is_main: bool,
    pub(crate) repository_url: String,
    pub(crate) repository_info: Option<RepositoryInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) display_path: Option<String>,
}

impl WorktreeEntry {
    pub(crate) fn from_details(path: PathBuf, is_main: bool, details: WorktreeDetails) -> Self {
        Self {
            path,
            branch: details.branch,
            commit_hash: details.commit_hash,
            is_main,
            repository_url: details.repository_url,
            repository_info: details.repository_info,
            display_path: None,
        }
    }

    /// Label shown in listings.
    ///
    /// Without repository names this is the branch. With them, an explicit display
    /// path wins, then `repo` for main checkouts and `repo:branch` for linked ones.
    pub(crate) fn display_label(&self, show_repo_name: bool) -> String {
        if !show_repo_name {
            return self.branch.clone();
        }
        if let Some(display_path) = self.display_path.as_deref()
            && !display_path.is_empty()
        {
            return display_path.to_string();
        }
        match &self.repository_info {
            Some(info) if self.is_main => info.repository.clone(),
            Some(info) => format!("{}:{}", info.repository, self.branch),
            None => self.branch.clone(),
        }
    }
}

/// Keep entries whose branch, path, `repo`, `owner/repo` or `owner/repo:branch`
/// contains `pattern`, ignoring case.
pub(crate) fn filter_entries(entries: Vec<WorktreeEntry>, pattern: &str) -> Vec<WorktreeEntry> {
    let pattern = pattern.to_lowercase();
    entries
        .into_iter()
        .filter(|entry| {
            matches_fields(
                &pattern,
                &entry.branch,
                &entry.path,
                entry.repository_info.as_ref(),
            )
        })
        .collect()
}

fn matches_fields(
    pattern: &str,
    branch: &str,
    path: &Path,
    info: Option<&RepositoryInfo>,
) -> bool {
    let branch = branch.to_lowercase();
    if branch.contains(pattern) || path.to_string_lossy().to_lowercase().contains(pattern) {
        return true;
    }

    let Some(info) = info else {
        return false;
    };
    let repo = info.repository.to_lowercase();
    let owner_repo = format!("{}/{repo}", info.owner.to_lowercase());
    let owner_repo_branch = format!("{owner_repo}:{branch}");
    repo.contains(pattern) || owner_repo.contains(pattern) || owner_repo_branch.contains(pattern)
}

/// Anything the aggregator can deduplicate by location.
pub(crate) trait Located {
    fn path(&self) -> &Path;
}

impl Located for WorktreeEntry {
    fn path(&self) -> &Path {
        &self.path
    }
}

/// A discovered checkout whose details are read on first use.
///
/// Only one extraction ever runs per entry. Concurrent callers of
/// [`LazyEntry::ensure_loaded`] block until it finishes and then all see its outcome.
pub(crate) struct LazyEntry {
    path: PathBuf,
    is_main: bool,
    display_path: Option<String>,
    extractor: Arc<Extractor>,
    state: OnceLock<Result<WorktreeDetails>>,
}

impl LazyEntry {
    pub(crate) fn new(path: PathBuf, is_main: bool, extractor: Arc<Extractor>) -> Self {
        Self {
            path,
            is_main,
            display_path: None,
            extractor,
            state: OnceLock::new(),
        }
    }

    pub(crate) fn with_display_path(mut self, display_path: Option<String>) -> Self {
        self.display_path = display_path;
        self
    }

    pub(crate) fn is_main(&self) -> bool {
        self.is_main
    }

    pub(crate) fn display_path(&self) -> Option<&str> {
        self.display_path.as_deref()
    }

    pub(crate) fn ensure_loaded(&self) -> std::result::Result<&WorktreeDetails, &DiscoveryError> {
        self.state.get_or_init(|| self.load()).as_ref()
    }

    /// Never blocks, even while another thread is loading.
    pub(crate) fn is_loaded(&self) -> bool {
        matches!(self.state.get(), Some(Ok(_)))
    }

    fn load(&self) -> Result<WorktreeDetails> {
        if self.path.as_os_str().is_empty() {
            return Err(DiscoveryError::PathRequired);
        }
        if self.is_main {
            self.extractor.main_repository(&self.path)
        } else {
            self.extractor.worktree(&self.path)
        }
    }

    fn loaded(&self) -> Option<&WorktreeDetails> {
        self.state.get().and_then(|state| state.as_ref().ok())
    }

    pub(crate) fn branch(&self) -> &str {
        self.loaded().map_or("", |details| details.branch.as_str())
    }

    pub(crate) fn commit_hash(&self) -> &str {
        self.loaded().map_or("", |details| details.commit_hash.as_str())
    }

    pub(crate) fn repository_url(&self) -> &str {
        self.loaded()
            .map_or("", |details| details.repository_url.as_str())
    }

    pub(crate) fn repository_info(&self) -> Option<&RepositoryInfo> {
        self.loaded()
            .and_then(|details| details.repository_info.as_ref())
    }

    /// Match on the path without loading; load only when the path does not match.
    pub(crate) fn matches(&self, pattern: &str) -> bool {
        let pattern = pattern.to_lowercase();
        if self.path.to_string_lossy().to_lowercase().contains(&pattern) {
            return true;
        }
        match self.ensure_loaded() {
            Ok(details) => matches_fields(
                &pattern,
                &details.branch,
                &self.path,
                details.repository_info.as_ref(),
            ),
            Err(_) => false,
        }
    }
}

impl Located for LazyEntry {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for LazyEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyEntry")
            .field("path", &self.path)
            .field("is_main", &self.is_main)
            .field("display_path", &self.display_path)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
