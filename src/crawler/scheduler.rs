//! Fetch scheduler - bounded batches with a barrier between rounds
//!
//! Each round pops up to `concurrency` addresses from the frontier, runs one
//! dispatch per address concurrently on the current task, and waits for the
//! whole batch to settle before touching the frontier again:
//! - successes are removed for good, recorded as completed, and their links
//!   offered to the frontier
//! - retryable failures go back to their original frontier position
//! - a fatal error is returned after the rest of the batch is reconciled

use crate::crawler::dispatcher::{Dispatch, DownloadOutcome, ResourceKind};
use crate::output::{ProgressEvent, ProgressReporter};
use crate::state::CrawlState;
use crate::MirrorError;
use futures::future::join_all;
use std::collections::HashMap;

/// How many times a failing address is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Consecutive failures tolerated before giving up (0 = never give up)
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn unlimited() -> Self {
        Self { max_retries: 0 }
    }

    pub fn limited(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Returns true once `failures` consecutive failures exceed the limit
    pub fn is_exhausted(&self, failures: u32) -> bool {
        self.max_retries > 0 && failures > self.max_retries
    }
}

/// Tally of what happened in one or more rounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundSummary {
    pub dispatched: u64,
    pub pages: u64,
    pub files_written: u64,
    pub files_skipped: u64,
    pub failed: u64,
    pub abandoned: u64,
    pub discovered: u64,
}

impl RoundSummary {
    /// Number of addresses completed successfully
    pub fn succeeded(&self) -> u64 {
        self.pages + self.files_written + self.files_skipped
    }

    /// Adds another summary into this one
    pub fn absorb(&mut self, other: &RoundSummary) {
        self.dispatched += other.dispatched;
        self.pages += other.pages;
        self.files_written += other.files_written;
        self.files_skipped += other.files_skipped;
        self.failed += other.failed;
        self.abandoned += other.abandoned;
        self.discovered += other.discovered;
    }
}

/// Drives dispatch rounds over a [`CrawlState`]
pub struct Scheduler<D> {
    dispatcher: D,
    concurrency: usize,
    retry: RetryPolicy,
    /// Consecutive failure count per pending address
    failures: HashMap<String, u32>,
    rounds: u64,
}

impl<D: Dispatch> Scheduler<D> {
    pub fn new(dispatcher: D, concurrency: usize, retry: RetryPolicy) -> Self {
        Self {
            dispatcher,
            concurrency: concurrency.max(1),
            retry,
            failures: HashMap::new(),
            rounds: 0,
        }
    }

    /// Number of rounds run so far
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Runs one round: pop a batch, dispatch it, reconcile the outcomes
    ///
    /// Returns an empty summary without dispatching if the frontier is empty.
    pub async fn run_round(
        &mut self,
        state: &mut CrawlState,
        reporter: &dyn ProgressReporter,
    ) -> Result<RoundSummary, MirrorError> {
        let before = state.progress();
        let batch = state.frontier.pop_batch(self.concurrency);
        let mut summary = RoundSummary {
            dispatched: batch.len() as u64,
            ..RoundSummary::default()
        };
        if batch.is_empty() {
            return Ok(summary);
        }

        self.rounds += 1;
        reporter.report(ProgressEvent::RoundStarted {
            round: self.rounds,
            batch_size: batch.len(),
            progress: before,
        });

        let dispatcher = &self.dispatcher;
        let outcomes = join_all(
            batch
                .iter()
                .map(|pending| dispatcher.dispatch(pending.address())),
        )
        .await;

        let mut discovered = Vec::new();
        let mut fatal = None;

        for (pending, outcome) in batch.into_iter().zip(outcomes) {
            match outcome {
                Ok(DownloadOutcome::Success { kind, links }) => {
                    self.failures.remove(pending.address());
                    state.mark_completed(pending.address());
                    match kind {
                        ResourceKind::Page => summary.pages += 1,
                        ResourceKind::File => summary.files_written += 1,
                        ResourceKind::Skipped => summary.files_skipped += 1,
                    }
                    reporter.report(ProgressEvent::Completed {
                        address: pending.address(),
                        kind,
                        progress: state.progress(),
                    });
                    discovered.extend(links);
                }

                Ok(DownloadOutcome::RetryableFailure { reason }) => {
                    let failures = self
                        .failures
                        .entry(pending.address().to_string())
                        .or_insert(0);
                    *failures += 1;
                    let attempts = *failures;

                    if self.retry.is_exhausted(attempts) {
                        self.failures.remove(pending.address());
                        state.mark_abandoned(pending.address());
                        summary.abandoned += 1;
                        reporter.report(ProgressEvent::Abandoned {
                            address: pending.address(),
                            reason: &reason,
                            attempts,
                        });
                    } else {
                        summary.failed += 1;
                        reporter.report(ProgressEvent::Failed {
                            address: pending.address(),
                            reason: &reason,
                            attempt: attempts,
                        });
                        state.frontier.restore(pending);
                    }
                }

                Err(e) => {
                    tracing::error!("Fatal error while processing {}: {}", pending.address(), e);
                    state.frontier.restore(pending);
                    if fatal.is_none() {
                        fatal = Some(e);
                    }
                }
            }
        }

        for link in discovered {
            if state.discover(&link) {
                summary.discovered += 1;
                tracing::trace!("Added {} to pending stack", link);
            }
        }

        match fatal {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}
