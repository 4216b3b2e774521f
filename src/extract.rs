//! Pluggable detail sources and the chain that tries them in order.

use crate::entry::WorktreeDetails;
use crate::error::{DiscoveryError, Result};
use crate::fast_path::FastReader;
use crate::git::{GitCli, GitFallback, GitRunner, read_main_repository};
use std::path::Path;
use std::sync::Arc;

/// Outcome of asking one source about one worktree.
#[derive(Debug)]
pub(crate) enum Probe {
    Found(WorktreeDetails),
    /// The source cannot interpret this layout; the next source should try.
    Unsupported(&'static str),
    Failed(DiscoveryError),
}

pub(crate) trait DetailSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn probe(&self, worktree: &Path) -> Probe;
}

/// Reads worktree details by asking each source in turn.
pub(crate) struct Extractor {
    sources: Vec<Box<dyn DetailSource>>,
    runner: Arc<dyn GitRunner>,
}

impl Extractor {
    pub(crate) fn new(sources: Vec<Box<dyn DetailSource>>, runner: Arc<dyn GitRunner>) -> Self {
        Self { sources, runner }
    }

    /// Direct file reads first, the `git` binary when they cannot answer.
    pub(crate) fn with_git() -> Self {
        let runner: Arc<dyn GitRunner> = Arc::new(GitCli);
        Self::new(
            vec![
                Box::new(FastReader),
                Box::new(GitFallback::new(Arc::clone(&runner))),
            ],
            runner,
        )
    }

    pub(crate) fn worktree(&self, path: &Path) -> Result<WorktreeDetails> {
        for source in &self.sources {
            match source.probe(path) {
                Probe::Found(details) => return Ok(details),
                Probe::Failed(err) => return Err(err),
                Probe::Unsupported(reason) => {
                    log::debug!("{} reader skipped {}: {reason}", source.name(), path.display());
                }
            }
        }
        Err(DiscoveryError::Unsupported(path.to_path_buf()))
    }

    pub(crate) fn main_repository(&self, path: &Path) -> Result<WorktreeDetails> {
        read_main_repository(self.runner.as_ref(), path)
    }
}
