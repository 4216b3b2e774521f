use serde::Serialize;

/// Host/owner/repository triple parsed from a remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct RepositoryInfo {
    pub(crate) host: String,
    pub(crate) owner: String,
    pub(crate) repository: String,
    pub(crate) full_path: String,
}

/// Parse a remote URL as git stores it (https, scp-like ssh, ssh://, CodeCommit).
///
/// Returns `None` when no host or fewer than two path segments can be found.
pub(crate) fn parse_repository_url(raw: &str) -> Option<RepositoryInfo> {
    let normalized = normalize_url(raw.trim());
    let without_scheme = normalized
        .strip_prefix("https://")
        .or_else(|| normalized.strip_prefix("http://"))?;

    let (authority, path) = match without_scheme.find('/') {
        Some(idx) => (&without_scheme[..idx], &without_scheme[idx..]),
        None => (without_scheme, ""),
    };
    let host = authority.rsplit('@').next().unwrap_or(authority);
    if host.is_empty() {
        return None;
    }

    let path = path.split(['?', '#']).next().unwrap_or(path);
    let mut segments = path.trim_matches('/').split('/');
    let owner = segments.next().filter(|value| !value.is_empty())?;
    let repository = segments.next().filter(|value| !value.is_empty())?;
    let repository = repository.strip_suffix(".git").unwrap_or(repository);

    Some(RepositoryInfo {
        host: host.to_string(),
        owner: owner.to_string(),
        repository: repository.to_string(),
        full_path: format!("{host}/{owner}/{repository}"),
    })
}

/// Rewrite the accepted remote forms into an `http(s)://` URL.
pub(crate) fn normalize_url(raw: &str) -> String {
    if raw.starts_with("codecommit::")
        && let Some(converted) = normalize_codecommit_url(raw)
    {
        return converted;
    }

    let mut url = raw.to_string();
    if let Some(rest) = raw.strip_prefix("git@") {
        if let Some((host, path)) = rest.split_once(':') {
            url = format!("https://{host}/{path}");
        }
    } else if let Some(rest) = raw.strip_prefix("ssh://git@") {
        url = match rest.split_once(':') {
            Some((host, path)) if !starts_with_port(path) => format!("https://{host}/{path}"),
            _ => format!("https://{rest}"),
        };
    } else if let Some(rest) = raw.strip_prefix("ssh://") {
        url = format!("https://{rest}");
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        url = format!("https://{url}");
    }
    url
}

/// `2222/owner/repo` after `host:` is a port, not an scp-style path.
fn starts_with_port(path: &str) -> bool {
    let digits = path.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && matches!(path.as_bytes().get(digits), None | Some(b'/'))
}

// codecommit::<region>://[<profile>@]<repo-name>
fn normalize_codecommit_url(raw: &str) -> Option<String> {
    let rest = raw.strip_prefix("codecommit::")?;
    let (region, repo) = rest.split_once("://")?;
    let name = repo.rsplit('@').next().unwrap_or(repo);
    Some(format!(
        "https://git-codecommit.{region}.amazonaws.com/repos/{name}"
    ))
}
