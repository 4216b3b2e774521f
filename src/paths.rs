use crate::error::{DiscoveryError, Result};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Expand `$VAR`, `${VAR}` and a leading `~`, then make the result absolute.
pub(crate) fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = expand_env_vars(raw);

    let path = if expanded == "~" || expanded.starts_with("~/") {
        let home = dirs::home_dir().ok_or_else(|| DiscoveryError::ExpandPath {
            path: raw.to_string(),
            message: "failed to get home directory".to_string(),
        })?;
        match expanded.strip_prefix("~/") {
            Some(rest) => home.join(rest),
            None => home,
        }
    } else {
        PathBuf::from(expanded)
    };

    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = env::current_dir().map_err(|err| DiscoveryError::ExpandPath {
        path: raw.to_string(),
        message: format!("failed to get absolute path: {err}"),
    })?;
    Ok(cwd.join(path))
}

fn expand_env_vars(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('$') {
        output.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{')
            && let Some(end) = braced.find('}')
        {
            output.push_str(&env::var(&braced[..end]).unwrap_or_default());
            rest = &braced[end + 1..];
            continue;
        }

        let name_len = after
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        if name_len == 0 {
            output.push('$');
            rest = after;
            continue;
        }
        output.push_str(&env::var(&after[..name_len]).unwrap_or_default());
        rest = &after[name_len..];
    }
    output.push_str(rest);
    output
}

/// Resolve the configured base directory.
///
/// `Ok(None)` means the directory does not exist, which callers treat as
/// "nothing to discover". A path that exists but is not a directory is an error.
pub(crate) fn expand_base_dir(base_dir: &str) -> Result<Option<PathBuf>> {
    if base_dir.trim().is_empty() {
        return Err(DiscoveryError::BaseDirNotConfigured);
    }

    let expanded = expand_path(base_dir)?;
    let metadata = match fs::metadata(&expanded) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(DiscoveryError::Io {
                path: expanded,
                source: err,
            });
        }
    };

    if !metadata.is_dir() {
        return Err(DiscoveryError::NotADirectory(expanded));
    }
    Ok(Some(expanded))
}

/// Replace the home directory prefix with `~` for display.
pub(crate) fn tilde_path(path: &Path) -> String {
    let Some(home) = dirs::home_dir() else {
        return path.display().to_string();
    };
    match path.strip_prefix(&home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => path.display().to_string(),
    }
}

/// The nested worktrees directory must stay inside the repository it belongs to.
pub(crate) fn validate_worktrees_dir(value: &str) -> Result<()> {
    let invalid = |reason| DiscoveryError::InvalidWorktreesDir {
        value: value.to_string(),
        reason,
    };

    if value.trim().is_empty() {
        return Err(invalid("must not be empty"));
    }
    let path = Path::new(value);
    if path.is_absolute() || value.starts_with('~') {
        return Err(invalid("must be a relative path"));
    }

    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(invalid("must not escape repository root"));
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("must be a relative path"));
            }
        }
    }
    Ok(())
}

/// Relative path of `path` below the first root that contains it.
pub(crate) fn relative_to_first_root(path: &Path, roots: &[PathBuf]) -> Option<String> {
    roots.iter().find_map(|root| {
        let rel = path.strip_prefix(root).ok()?;
        if rel.as_os_str().is_empty() {
            return None;
        }
        Some(rel.to_string_lossy().replace('\\', "/"))
    })
}
