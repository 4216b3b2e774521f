use crossbeam_channel::bounded;
use std::thread;

/// Run `work` over `items` on a fixed pool of at most `workers` threads.
///
/// Jobs are queued as `(index, slot)` pairs, so each worker owns the result slot of
/// the job it pulled and nothing needs a lock. `None` results are dropped; the
/// survivors keep the order of `items`.
pub(crate) fn run_pool<T, R, F>(items: &[T], workers: usize, work: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Option<R> + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }

    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(items.len()).collect();
    {
        let (jobs_tx, jobs_rx) = bounded(items.len());
        for job in slots.iter_mut().enumerate() {
            // Capacity equals the job count and the receiver is alive, so this never fails.
            if jobs_tx.send(job).is_err() {
                break;
            }
        }
        drop(jobs_tx);

        let work = &work;
        thread::scope(|scope| {
            for _ in 0..workers.clamp(1, items.len()) {
                let jobs_rx = jobs_rx.clone();
                scope.spawn(move || {
                    for (idx, slot) in jobs_rx {
                        *slot = work(&items[idx]);
                    }
                });
            }
        });
    }

    slots.into_iter().flatten().collect()
}
