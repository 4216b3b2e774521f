//! Turns a base directory into worktree entries.
//!
//! Three strategies share one walker and one extractor and must agree on the
//! resulting set of paths:
//!
//! - `Serial` extracts one path at a time after the walk.
//! - `Pool` walks first, then drains the collected paths with a fixed worker pool.
//! - `Pipeline` feeds paths to the workers while the walk is still running; a
//!   single collector thread owns the result list.

use crate::constants::{MAX_DEFAULT_WORKERS, PIPELINE_QUEUE_FACTOR, WORKERS_ENV};
use crate::entry::{LazyEntry, WorktreeEntry};
use crate::error::{DiscoveryError, Result, warn_unless_not_found};
use crate::extract::Extractor;
use crate::paths::expand_base_dir;
use crate::pool::run_pool;
use crate::walker::{collect_worktree_paths, walk_worktrees};
use crossbeam_channel::bounded;
use serde::Deserialize;
use std::env;
use std::num::NonZeroUsize;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Strategy {
    Serial,
    Pool,
    #[default]
    Pipeline,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DiscoverOptions {
    pub(crate) workers: Option<usize>,
    pub(crate) strategy: Strategy,
}

/// Worker count: `min(cpus, 4)`, then the requested value, then the env override.
pub(crate) fn resolve_workers(requested: Option<usize>) -> usize {
    let mut workers = thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(MAX_DEFAULT_WORKERS);

    if let Some(requested) = requested
        && requested > 0
    {
        workers = requested;
    }

    if let Ok(raw) = env::var(WORKERS_ENV)
        && let Ok(parsed) = raw.trim().parse::<usize>()
        && parsed > 0
    {
        workers = parsed;
    }
    workers
}

pub(crate) struct Discoverer {
    extractor: Arc<Extractor>,
    workers: usize,
    strategy: Strategy,
}

impl Discoverer {
    pub(crate) fn new(extractor: Arc<Extractor>, options: &DiscoverOptions) -> Self {
        Self {
            extractor,
            workers: resolve_workers(options.workers),
            strategy: options.strategy,
        }
    }

    pub(crate) fn workers(&self) -> usize {
        self.workers
    }

    pub(crate) fn extractor(&self) -> &Arc<Extractor> {
        &self.extractor
    }

    /// All worktrees below `base_dir`, using the configured strategy.
    ///
    /// A missing base directory yields no entries. Only a structural problem with
    /// the base directory itself is an error; failed entries are skipped.
    pub(crate) fn discover(&self, base_dir: &str) -> Result<Vec<WorktreeEntry>> {
        let Some(base) = expand_base_dir(base_dir)? else {
            return Ok(Vec::new());
        };

        let started = Instant::now();
        let entries = match self.strategy {
            Strategy::Serial => self.serial(&base),
            Strategy::Pool => self.pool(&base),
            Strategy::Pipeline => self.pipeline(&base),
        }?;
        log::debug!(
            "{:?} discovery found {} worktrees under {} in {:?} ({} workers)",
            self.strategy,
            entries.len(),
            base.display(),
            started.elapsed(),
            self.workers
        );
        Ok(entries)
    }

    /// Walk only; details are read when each entry is first asked for them.
    pub(crate) fn discover_lazy(&self, base_dir: &str) -> Result<Vec<LazyEntry>> {
        let Some(base) = expand_base_dir(base_dir)? else {
            return Ok(Vec::new());
        };
        let entries = collect_worktree_paths(&base)?
            .into_iter()
            .map(|path| LazyEntry::new(path, false, Arc::clone(&self.extractor)))
            .collect();
        Ok(entries)
    }

    pub(crate) fn serial(&self, base: &Path) -> Result<Vec<WorktreeEntry>> {
        let entries = collect_worktree_paths(base)?
            .iter()
            .filter_map(|path| extract_entry(&self.extractor, path))
            .collect();
        Ok(entries)
    }

    pub(crate) fn pool(&self, base: &Path) -> Result<Vec<WorktreeEntry>> {
        let paths = collect_worktree_paths(base)?;
        let extractor = self.extractor.as_ref();
        Ok(run_pool(&paths, self.workers, |path| {
            extract_entry(extractor, path)
        }))
    }

    pub(crate) fn pipeline(&self, base: &Path) -> Result<Vec<WorktreeEntry>> {
        self.pipeline_with(|emit| walk_worktrees(base, emit))
    }

    /// Run the pipeline over whatever paths `walk` emits.
    ///
    /// Paths already emitted are still extracted when `walk` fails; its error is
    /// returned once the workers and the collector have drained.
    pub(crate) fn pipeline_with<W>(&self, walk: W) -> Result<Vec<WorktreeEntry>>
    where
        W: FnOnce(&mut dyn FnMut(PathBuf) -> Result<()>) -> Result<()>,
    {
        let capacity = self.workers * PIPELINE_QUEUE_FACTOR;
        let (path_tx, path_rx) = bounded::<PathBuf>(capacity);
        let (entry_tx, entry_rx) = bounded::<WorktreeEntry>(capacity);
        let extractor = self.extractor.as_ref();

        thread::scope(|scope| {
            let collector = scope.spawn(move || entry_rx.iter().collect::<Vec<_>>());

            let workers: Vec<_> = (0..self.workers)
                .map(|_| {
                    let path_rx = path_rx.clone();
                    let entry_tx = entry_tx.clone();
                    scope.spawn(move || {
                        for path in path_rx {
                            if let Some(entry) = extract_entry(extractor, &path)
                                && entry_tx.send(entry).is_err()
                            {
                                break;
                            }
                        }
                    })
                })
                .collect();
            drop(path_rx);
            drop(entry_tx);

            let walked = walk(&mut |path: PathBuf| {
                path_tx
                    .send(path)
                    .map_err(|_| DiscoveryError::PipelineClosed)
            });
            drop(path_tx);

            for worker in workers {
                if let Err(payload) = worker.join() {
                    panic::resume_unwind(payload);
                }
            }
            let entries = match collector.join() {
                Ok(entries) => entries,
                Err(payload) => panic::resume_unwind(payload),
            };

            walked.map(|()| entries)
        })
    }
}

fn extract_entry(extractor: &Extractor, path: &Path) -> Option<WorktreeEntry> {
    match extractor.worktree(path) {
        Ok(details) => Some(WorktreeEntry::from_details(
            path.to_path_buf(),
            false,
            details,
        )),
        Err(err) => {
            warn_unless_not_found("failed to extract worktree info from", path, &err);
            None
        }
    }
}
