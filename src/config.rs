use crate::constants::{DEFAULT_BASE_DIR, DEFAULT_INDEX_WORKTREES_DIR};
use crate::discovery::{DiscoverOptions, Strategy};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Default)]
struct PartialConfig {
    worktree: Option<PartialWorktree>,
    ghq: Option<PartialGhq>,
    discovery: Option<PartialDiscovery>,
    ui: Option<PartialUi>,
}

#[derive(Debug, Deserialize, Default)]
struct PartialWorktree {
    basedir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PartialGhq {
    enabled: Option<bool>,
    worktrees_dir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PartialDiscovery {
    workers: Option<usize>,
    strategy: Option<Strategy>,
}

#[derive(Debug, Deserialize, Default)]
struct PartialUi {
    tilde_home: Option<bool>,
    show_repo_name: Option<bool>,
}

#[derive(Debug, Clone)]
pub(crate) struct WorktreeConfig {
    pub(crate) base_dir: String,
}

#[derive(Debug, Clone)]
pub(crate) struct GhqConfig {
    pub(crate) enabled: bool,
    pub(crate) worktrees_dir: String,
}

#[derive(Debug, Clone)]
pub(crate) struct UiConfig {
    pub(crate) tilde_home: bool,
    pub(crate) show_repo_name: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) worktree: WorktreeConfig,
    pub(crate) ghq: GhqConfig,
    pub(crate) discovery: DiscoverOptions,
    pub(crate) ui: UiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worktree: WorktreeConfig {
                base_dir: DEFAULT_BASE_DIR.to_string(),
            },
            ghq: GhqConfig {
                enabled: false,
                worktrees_dir: DEFAULT_INDEX_WORKTREES_DIR.to_string(),
            },
            discovery: DiscoverOptions::default(),
            ui: UiConfig {
                tilde_home: true,
                show_repo_name: true,
            },
        }
    }
}

impl Config {
    /// Defaults overlaid with the first config file that exists.
    pub(crate) fn load() -> Result<Self> {
        for path in config_paths() {
            if !path.exists() {
                continue;
            }
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let config = Self::from_toml_str(&raw)
                .with_context(|| format!("failed to parse config file {}", path.display()))?;
            log::debug!("loaded config from {}", path.display());
            return Ok(config);
        }
        Ok(Self::default())
    }

    pub(crate) fn from_toml_str(raw: &str) -> Result<Self> {
        let parsed: PartialConfig = toml::from_str(raw)?;
        let mut config = Self::default();
        config.apply(parsed);
        Ok(config)
    }

    fn apply(&mut self, parsed: PartialConfig) {
        if let Some(worktree) = parsed.worktree
            && let Some(basedir) = worktree.basedir
        {
            // An explicit empty string disables the base-directory source.
            self.worktree.base_dir = basedir.trim().to_string();
        }

        if let Some(ghq) = parsed.ghq {
            if let Some(enabled) = ghq.enabled {
                self.ghq.enabled = enabled;
            }
            if let Some(worktrees_dir) = ghq.worktrees_dir
                && !worktrees_dir.trim().is_empty()
            {
                self.ghq.worktrees_dir = worktrees_dir;
            }
        }

        if let Some(discovery) = parsed.discovery {
            if let Some(workers) = discovery.workers
                && workers > 0
            {
                self.discovery.workers = Some(workers);
            }
            if let Some(strategy) = discovery.strategy {
                self.discovery.strategy = strategy;
            }
        }

        if let Some(ui) = parsed.ui {
            if let Some(tilde_home) = ui.tilde_home {
                self.ui.tilde_home = tilde_home;
            }
            if let Some(show_repo_name) = ui.show_repo_name {
                self.ui.show_repo_name = show_repo_name;
            }
        }
    }
}

fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("wtscout").join("config.toml"));
    }
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".wtscout.toml"));
    }
    paths
}
