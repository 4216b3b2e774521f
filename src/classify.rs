//! Decides, for one directory, whether it is a linked worktree and whether the
//! walker may descend into it.

use crate::constants::{GIT_DIR_NAME, GITDIR_PREFIX};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Classification {
    pub(crate) is_worktree: bool,
    pub(crate) prune: bool,
}

impl Classification {
    const DESCEND: Self = Self {
        is_worktree: false,
        prune: false,
    };
    const SKIP: Self = Self {
        is_worktree: false,
        prune: true,
    };
    const WORKTREE: Self = Self {
        is_worktree: true,
        prune: true,
    };
}

pub(crate) fn classify_dir(path: &Path, is_dir: bool) -> Classification {
    if !is_dir {
        return Classification::DESCEND;
    }
    if path.file_name().is_some_and(|name| name == GIT_DIR_NAME) {
        return Classification::SKIP;
    }

    let marker = path.join(GIT_DIR_NAME);
    let metadata = match fs::symlink_metadata(&marker) {
        Ok(metadata) => metadata,
        Err(err) => {
            if err.kind() != ErrorKind::NotFound {
                log::warn!("failed to stat {}: {err}", marker.display());
            }
            return Classification::DESCEND;
        }
    };

    let file_type = metadata.file_type();
    if file_type.is_dir() {
        return Classification::SKIP;
    }

    if file_type.is_symlink() {
        return match fs::metadata(&marker) {
            Ok(target) if target.is_dir() => Classification::SKIP,
            Ok(target) if target.is_file() => classify_pointer(&marker),
            _ => Classification::DESCEND,
        };
    }

    if !file_type.is_file() {
        return Classification::DESCEND;
    }
    classify_pointer(&marker)
}

fn classify_pointer(marker: &Path) -> Classification {
    if has_gitdir_pointer(marker) {
        Classification::WORKTREE
    } else {
        Classification::DESCEND
    }
}

/// True when `marker` is a readable file whose content starts with `gitdir:`.
pub(crate) fn has_gitdir_pointer(marker: &Path) -> bool {
    fs::read_to_string(marker)
        .map(|content| content.trim().starts_with(GITDIR_PREFIX))
        .unwrap_or(false)
}

