use crate::classify::classify_dir;
use crate::error::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walk `base` and hand every linked worktree to `on_worktree`.
///
/// Worktrees, main repositories and `.git` directories are never descended into.
/// Per-entry errors are skipped; only an error returned by `on_worktree` stops the walk.
pub(crate) fn walk_worktrees<F>(base: &Path, mut on_worktree: F) -> Result<()>
where
    F: FnMut(PathBuf) -> Result<()>,
{
    let mut entries = WalkDir::new(base).follow_links(false).into_iter();
    while let Some(next) = entries.next() {
        let entry = match next {
            Ok(entry) => entry,
            Err(err) => {
                let not_found = err
                    .io_error()
                    .is_some_and(|io| io.kind() == ErrorKind::NotFound);
                if !not_found {
                    log::warn!("skipping unreadable entry: {err}");
                }
                continue;
            }
        };

        let is_dir = entry.file_type().is_dir();
        let classification = classify_dir(entry.path(), is_dir);
        if classification.prune && is_dir {
            entries.skip_current_dir();
        }
        if classification.is_worktree {
            on_worktree(entry.into_path())?;
        }
    }
    Ok(())
}

pub(crate) fn collect_worktree_paths(base: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    walk_worktrees(base, |path| {
        paths.push(path);
        Ok(())
    })?;
    Ok(paths)
}
