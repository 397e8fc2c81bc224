//! Bounded, order-preserving parallel execution of stage items.
//!
//! Workers run on a dedicated rayon pool and only compute. Every
//! completion travels over one bounded channel to the calling thread,
//! which is the single place that records results and reports progress.
//! Results are re-sequenced by input index, so parallelism never changes
//! the order a stage produces.

use super::{CancellationToken, ItemOutcome};
use crate::error::StageError;
use crossbeam_channel::bounded;
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::debug;

/// Runs stage items with at most `concurrency` of them in flight
pub struct StageRunner {
    pool: ThreadPool,
    concurrency: usize,
    check_interval: usize,
}

impl StageRunner {
    /// Build a runner with its own worker pool.
    ///
    /// `check_interval` is how many completions the aggregating thread
    /// handles between cancellation checks. Workers additionally check
    /// before starting each item.
    pub fn new(concurrency: usize, check_interval: usize) -> Result<Self, StageError> {
        let concurrency = concurrency.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|i| format!("photo-triage-worker-{}", i))
            .build()
            .map_err(|e| StageError::WorkerPool(e.to_string()))?;

        debug!(concurrency, check_interval, "Worker pool ready");

        Ok(Self {
            pool,
            concurrency,
            check_interval: check_interval.max(1),
        })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Process every item and return their outcomes in input order.
    ///
    /// `on_item_done` receives the running count of completed items
    /// (done or skipped) and is always called on the current thread.
    /// Returns [`StageError::Cancelled`] if cancellation is observed;
    /// outcomes of items that were still in flight are discarded.
    pub fn run<I, R, W, P>(
        &self,
        items: &[I],
        cancel: &CancellationToken,
        work: W,
        mut on_item_done: P,
    ) -> Result<Vec<ItemOutcome<R>>, StageError>
    where
        I: Sync,
        R: Send,
        W: Fn(&I) -> ItemOutcome<R> + Sync,
        P: FnMut(usize),
    {
        if cancel.is_cancelled() {
            return Err(StageError::Cancelled);
        }

        let total = items.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let (sender, receiver) = bounded::<(usize, ItemOutcome<R>)>(self.concurrency);
        let mut slots: Vec<Option<ItemOutcome<R>>> = Vec::with_capacity(total);
        slots.resize_with(total, || None);

        let mut processed = 0;
        let mut cancelled = false;
        let work = &work;

        std::thread::scope(|scope| {
            scope.spawn(move || {
                self.pool.install(|| {
                    items
                        .par_iter()
                        .enumerate()
                        .for_each_with(sender, |sender, (index, item)| {
                            if cancel.is_cancelled() {
                                return;
                            }
                            let _ = sender.send((index, work(item)));
                        });
                });
            });

            // Drain until every worker has finished so none blocks on send.
            for (index, outcome) in receiver.iter() {
                if cancelled {
                    continue;
                }

                slots[index] = Some(outcome);
                processed += 1;
                on_item_done(processed);

                if processed % self.check_interval == 0 && cancel.is_cancelled() {
                    debug!(processed, total, "Cancellation observed mid-stage");
                    cancelled = true;
                }
            }
        });

        if cancelled || cancel.is_cancelled() {
            return Err(StageError::Cancelled);
        }

        debug_assert!(slots.iter().all(Option::is_some));
        Ok(slots.into_iter().flatten().collect())
    }
}
