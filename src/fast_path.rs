//! Reads a linked worktree's branch, commit and origin URL straight from the
//! files git keeps on disk, without spawning a process.
//!
//! Anything outside the small set of layouts handled here is reported as
//! [`Probe::Unsupported`] so the caller can ask `git` instead.

use crate::constants::{
    BRANCH_REF_PREFIX, COMMIT_HASH_LEN, COMMONDIR_FILE, CONFIG_FILE, DEFAULT_REMOTE,
    DETACHED_BRANCH, GIT_DIR_NAME, GITDIR_PREFIX, HEAD_FILE, WORKTREES_SUBDIR,
};
use crate::entry::WorktreeDetails;
use crate::error::DiscoveryError;
use crate::extract::{DetailSource, Probe};
use crate::remote_url::parse_repository_url;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

pub(crate) struct FastReader;

impl DetailSource for FastReader {
    fn name(&self) -> &'static str {
        "fast"
    }

    fn probe(&self, worktree: &Path) -> Probe {
        match read_worktree_details(worktree) {
            Ok(details) => Probe::Found(details),
            Err(stop) => stop,
        }
    }
}

fn read_worktree_details(worktree: &Path) -> Result<WorktreeDetails, Probe> {
    let pointer = worktree.join(GIT_DIR_NAME);
    let content = match fs::read_to_string(&pointer) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(Probe::Failed(DiscoveryError::NotFound(worktree.to_path_buf())));
        }
        Err(_) => return Err(Probe::Unsupported("unreadable .git file")),
    };
    let gitdir = parse_gitdir_pointer(&content)
        .map(|raw| resolve_against(worktree, raw))
        .ok_or(Probe::Unsupported("missing gitdir: prefix"))?;

    let head = fs::read_to_string(gitdir.join(HEAD_FILE))
        .map_err(|_| Probe::Unsupported("unreadable HEAD"))?;
    let (branch, commit) = match parse_head(&head) {
        HeadRef::Branch(branch) => (branch, None),
        HeadRef::Detached(commit) => (DETACHED_BRANCH.to_string(), Some(commit)),
        HeadRef::Other => return Err(Probe::Unsupported("HEAD is not a local branch or commit")),
    };

    let main_git_dir = find_main_git_dir(&gitdir);

    let commit_hash = match commit {
        Some(commit) => commit,
        None => read_loose_ref(&main_git_dir, &branch)
            .ok_or(Probe::Unsupported("branch is not a loose ref"))?,
    };

    let config = fs::read_to_string(main_git_dir.join(CONFIG_FILE))
        .map_err(|_| Probe::Unsupported("unreadable config"))?;
    let repository_url = match scan_remote_url(&config, DEFAULT_REMOTE) {
        RemoteUrl::Found(url) => url,
        RemoteUrl::Missing => String::new(),
        RemoteUrl::Includes => return Err(Probe::Unsupported("config uses include directives")),
    };
    let repository_info = parse_repository_url(&repository_url);

    Ok(WorktreeDetails {
        repository_url,
        repository_info,
        branch,
        commit_hash,
    })
}

/// Target of a `gitdir: <path>` pointer, trimmed.
pub(crate) fn parse_gitdir_pointer(content: &str) -> Option<&str> {
    content
        .trim()
        .strip_prefix(GITDIR_PREFIX)
        .map(str::trim)
        .filter(|target| !target.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HeadRef {
    Branch(String),
    Detached(String),
    /// Tags, remote-tracking refs and anything else.
    Other,
}

pub(crate) fn parse_head(content: &str) -> HeadRef {
    let content = content.trim();
    if let Some(branch) = content.strip_prefix(BRANCH_REF_PREFIX)
        && !branch.is_empty()
    {
        return HeadRef::Branch(branch.to_string());
    }
    if is_commit_hash(content) {
        return HeadRef::Detached(content.to_string());
    }
    HeadRef::Other
}

pub(crate) fn is_commit_hash(value: &str) -> bool {
    value.len() == COMMIT_HASH_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// The repository's shared `.git` directory for a worktree's private gitdir.
///
/// `commondir` is authoritative when present. Otherwise `<repo>/.git/worktrees/<name>`
/// is cut back to `<repo>/.git`; any other shape yields `gitdir` itself.
pub(crate) fn find_main_git_dir(gitdir: &Path) -> PathBuf {
    if let Ok(content) = fs::read_to_string(gitdir.join(COMMONDIR_FILE)) {
        let commondir = content.trim();
        if !commondir.is_empty() {
            return resolve_against(gitdir, commondir);
        }
    }

    for dir in gitdir.ancestors() {
        if dir.file_name().is_some_and(|name| name == WORKTREES_SUBDIR)
            && let Some(parent) = dir.parent()
            && parent.file_name().is_some_and(|name| name == GIT_DIR_NAME)
        {
            return parent.to_path_buf();
        }
    }
    gitdir.to_path_buf()
}

// Packed refs are left to git.
fn read_loose_ref(main_git_dir: &Path, branch: &str) -> Option<String> {
    let content = fs::read_to_string(main_git_dir.join("refs").join("heads").join(branch)).ok()?;
    let commit = content.trim();
    is_commit_hash(commit).then(|| commit.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RemoteUrl {
    Found(String),
    Missing,
    Includes,
}

/// Find `url` under `[remote "<remote>"]` in a git config file.
///
/// Files with `[include]` or `[includeIf ...]` sections are refused outright since
/// the remote could be defined in a file this scanner does not follow.
pub(crate) fn scan_remote_url(config: &str, remote: &str) -> RemoteUrl {
    if config.lines().any(is_include_header) {
        return RemoteUrl::Includes;
    }

    let header = format!("[remote \"{remote}\"]").to_ascii_lowercase();
    let mut in_remote = false;
    for line in config.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_remote = trimmed.to_ascii_lowercase() == header;
            continue;
        }
        if in_remote && let Some(url) = url_value(trimmed) {
            return RemoteUrl::Found(url);
        }
    }
    RemoteUrl::Missing
}

fn is_include_header(line: &str) -> bool {
    let Some(section) = line.trim().strip_prefix('[') else {
        return false;
    };
    let name: String = section
        .trim_start()
        .chars()
        .take_while(|ch| !ch.is_whitespace() && *ch != '"' && *ch != ']')
        .collect();
    name.eq_ignore_ascii_case("include") || name.eq_ignore_ascii_case("includeif")
}

fn url_value(line: &str) -> Option<String> {
    let key = line.get(..3)?;
    if !key.eq_ignore_ascii_case("url") {
        return None;
    }
    let value = line[3..].trim_start_matches([' ', '\t']).strip_prefix('=')?.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value);
    (!value.is_empty()).then(|| value.to_string())
}

fn resolve_against(base: &Path, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.is_absolute() {
        return clean_path(target);
    }
    clean_path(&base.join(target))
}

/// Lexically drop `.` and fold `..` into the preceding component.
fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(cleaned.components().next_back(), Some(Component::Normal(_)))
                    && cleaned.pop();
                if !popped && !cleaned.has_root() {
                    cleaned.push("..");
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}
