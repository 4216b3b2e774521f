mod aggregate;
mod classify;
mod cli;
mod commands;
mod config;
mod constants;
mod discovery;
mod entry;
mod error;
mod extract;
mod fast_path;
mod git;
mod paths;
mod pool;
mod process;
mod remote_url;
mod repo_index;
mod walker;


use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::Config;
use env_logger::{Builder, Env, Target};

fn main() {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .target(Target::Stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    commands::run(cli.command, &config)
}
