use crate::discovery::Strategy;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "wtscout",
    version,
    about = "Find git worktrees across a base directory and ghq-managed repositories"
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Run sanity checks for git, the base directory and ghq.
    Doctor,
    /// List discovered worktrees, optionally filtered by a pattern.
    #[command(alias = "ls")]
    List {
        /// Case-insensitive match against branch, path, repo, owner/repo or owner/repo:branch.
        pattern: Option<String>,
        #[arg(long)]
        json: bool,
        /// Override the configured discovery strategy.
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
        /// Override the worker count (the WTSCOUT_DISCOVERY_WORKERS env var still wins).
        #[arg(short = 'w', long)]
        workers: Option<usize>,
        /// Skip metadata extraction; details are read only when the pattern needs them.
        #[arg(long)]
        paths: bool,
    },
}
