use crate::aggregate::{discover_configured, discover_configured_lazy};
use crate::cli::Commands;
use crate::config::Config;
use crate::constants::{GIT_BIN, SHORT_HASH_LEN};
use crate::discovery::{DiscoverOptions, Discoverer, Strategy, resolve_workers};
use crate::entry::{LazyEntry, Located, WorktreeEntry, filter_entries};
use crate::extract::Extractor;
use crate::paths::{expand_base_dir, tilde_path, validate_worktrees_dir};
use crate::process::{first_line, run_capture};
use crate::remote_url::RepositoryInfo;
use crate::repo_index::{GhqCli, RepositoryIndex};
use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

pub(crate) fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Doctor => cmd_doctor(config),
        Commands::List {
            pattern,
            json,
            strategy,
            workers,
            paths,
        } => {
            let request = ListRequest {
                pattern,
                json,
                strategy,
                workers,
                paths,
            };
            cmd_list(config, &request)
        }
    }
}

#[derive(Debug)]
struct ListRequest {
    pattern: Option<String>,
    json: bool,
    strategy: Option<Strategy>,
    workers: Option<usize>,
    paths: bool,
}

impl ListRequest {
    fn options(&self, config: &Config) -> DiscoverOptions {
        let mut options = config.discovery.clone();
        if let Some(strategy) = self.strategy {
            options.strategy = strategy;
        }
        if self.workers.is_some() {
            options.workers = self.workers;
        }
        options
    }

    fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref().filter(|pattern| !pattern.is_empty())
    }
}

fn cmd_list(config: &Config, request: &ListRequest) -> Result<()> {
    let discoverer = Discoverer::new(Arc::new(Extractor::with_git()), &request.options(config));
    let index = GhqCli;

    if request.paths {
        let mut entries = discover_configured_lazy(config, &discoverer, &index)
            .context("failed to discover worktrees")?;
        if let Some(pattern) = request.pattern() {
            entries.retain(|entry| entry.matches(pattern));
        }
        entries.sort_by(|a, b| a.path().cmp(b.path()));
        return print_lazy(config, &entries, request.json);
    }

    let mut entries = discover_configured(config, &discoverer, &index)
        .context("failed to discover worktrees")?;
    if let Some(pattern) = request.pattern() {
        entries = filter_entries(entries, pattern);
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    print_entries(config, &entries, request.json)
}

fn display_path(config: &Config, path: &Path) -> String {
    if config.ui.tilde_home {
        tilde_path(path)
    } else {
        path.display().to_string()
    }
}

fn short_hash(hash: &str) -> &str {
    hash.get(..SHORT_HASH_LEN).unwrap_or(hash)
}

fn print_entries(config: &Config, entries: &[WorktreeEntry], as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No worktrees found");
        return Ok(());
    }

    let rows: Vec<(String, &str, String)> = entries
        .iter()
        .map(|entry| {
            let mut label = entry.display_label(config.ui.show_repo_name);
            if entry.is_main {
                label.push_str(" (main)");
            }
            (
                label,
                short_hash(&entry.commit_hash),
                display_path(config, &entry.path),
            )
        })
        .collect();
    let width = rows
        .iter()
        .map(|(label, _, _)| label.chars().count())
        .max()
        .unwrap_or(0)
        .max("BRANCH".len());

    println!("{:<width$} {:<8} PATH", "BRANCH", "COMMIT");
    for (label, hash, path) in rows {
        println!("{label:<width$} {hash:<8} {path}");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct LazyRow<'a> {
    path: &'a Path,
    is_main: bool,
    loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_path: Option<&'a str>,
    branch: &'a str,
    commit_hash: &'a str,
    repository_url: &'a str,
    repository_info: Option<&'a RepositoryInfo>,
}

impl<'a> From<&'a LazyEntry> for LazyRow<'a> {
    fn from(entry: &'a LazyEntry) -> Self {
        Self {
            path: entry.path(),
            is_main: entry.is_main(),
            loaded: entry.is_loaded(),
            display_path: entry.display_path(),
            branch: entry.branch(),
            commit_hash: entry.commit_hash(),
            repository_url: entry.repository_url(),
            repository_info: entry.repository_info(),
        }
    }
}

/// Lazy listings only show what is already known; nothing is loaded for output.
fn print_lazy(config: &Config, entries: &[LazyEntry], as_json: bool) -> Result<()> {
    if as_json {
        let rows: Vec<LazyRow<'_>> = entries.iter().map(LazyRow::from).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No worktrees found");
        return Ok(());
    }
    for entry in entries {
        let path = display_path(config, entry.path());
        match entry.display_path() {
            Some(label) => println!("{path}\t{label}"),
            None if entry.is_main() => println!("{path}\t(main)"),
            None => println!("{path}"),
        }
    }
    Ok(())
}

#[derive(Debug)]
struct Check {
    name: String,
    ok: bool,
    detail: String,
    fix: Option<String>,
}

impl Check {
    fn ok(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok: true,
            detail: detail.into(),
            fix: None,
        }
    }

    fn fail(name: impl Into<String>, detail: impl Into<String>, fix: Option<String>) -> Self {
        Self {
            name: name.into(),
            ok: false,
            detail: detail.into(),
            fix,
        }
    }

    fn print(&self) {
        let state = if self.ok { "OK" } else { "FAIL" };
        println!("[{state}] {}: {}", self.name, self.detail);
        if let Some(fix) = &self.fix {
            println!("      fix: {fix}");
        }
    }
}

fn cmd_doctor(config: &Config) -> Result<()> {
    log::info!("doctor: running environment checks");
    let mut checks = vec![git_check(), base_dir_check(&config.worktree.base_dir)];

    if config.ghq.enabled {
        let index = GhqCli;
        if index.is_installed() {
            checks.push(Check::ok("ghq installed", "`ghq root` works"));
        } else {
            checks.push(Check::fail(
                "ghq installed",
                "`ghq root` failed",
                Some("install ghq or set `[ghq] enabled = false`".to_string()),
            ));
        }

        match validate_worktrees_dir(&config.ghq.worktrees_dir) {
            Ok(()) => checks.push(Check::ok(
                "ghq worktrees_dir",
                format!("nested worktrees under `{}`", config.ghq.worktrees_dir),
            )),
            Err(err) => checks.push(Check::fail(
                "ghq worktrees_dir",
                err.to_string(),
                Some("use a relative path such as `.worktrees`".to_string()),
            )),
        }
    }

    checks.push(Check::ok(
        "Discovery workers",
        format!(
            "{} workers, {:?} strategy",
            resolve_workers(config.discovery.workers),
            config.discovery.strategy
        ),
    ));

    let failed = checks.iter().any(|check| !check.ok);
    for check in checks {
        check.print();
    }

    if failed {
        bail!("doctor found failing checks")
    } else {
        Ok(())
    }
}

fn git_check() -> Check {
    match run_capture(GIT_BIN, &["--version"], None) {
        Ok(output) if output.status.success() => {
            Check::ok("git installed", first_line(&output.stdout))
        }
        Ok(output) => Check::fail("git installed", first_line(&output.stderr), None),
        Err(_) => Check::fail(
            "git installed",
            "`git` is not callable",
            Some("install git and ensure it is on PATH".to_string()),
        ),
    }
}

fn base_dir_check(base_dir: &str) -> Check {
    if base_dir.is_empty() {
        return Check::ok("Base directory", "disabled (`[worktree] basedir` is empty)");
    }
    match expand_base_dir(base_dir) {
        Ok(Some(path)) => Check::ok("Base directory", format!("found {}", path.display())),
        Ok(None) => Check::ok(
            "Base directory",
            format!("{base_dir} does not exist yet; nothing to discover there"),
        ),
        Err(err) => Check::fail(
            "Base directory",
            err.to_string(),
            Some("point `[worktree] basedir` at a directory".to_string()),
        ),
    }
}
