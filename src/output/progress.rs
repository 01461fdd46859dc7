//! Progress events emitted by the crawl core
//!
//! The core never renders progress itself. It emits [`ProgressEvent`]s to a
//! [`ProgressReporter`], and front ends decide how to show them.

use crate::crawler::ResourceKind;
use crate::state::Progress;
use std::path::Path;

/// Something observable that happened during a run
#[derive(Debug, Clone, Copy)]
pub enum ProgressEvent<'a> {
    /// A batch of addresses is about to be dispatched
    RoundStarted {
        round: u64,
        batch_size: usize,
        progress: Progress,
    },

    /// An address was processed successfully
    Completed {
        address: &'a str,
        kind: ResourceKind,
        progress: Progress,
    },

    /// An address failed and stays pending
    Failed {
        address: &'a str,
        reason: &'a str,
        attempt: u32,
    },

    /// An address exceeded the retry limit and was dropped
    Abandoned {
        address: &'a str,
        reason: &'a str,
        attempts: u32,
    },

    /// A checkpoint was written
    CheckpointSaved { path: &'a Path, progress: Progress },
}

/// Receives progress events from the crawl core
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent<'_>);
}

/// Reporter that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn report(&self, _event: ProgressEvent<'_>) {}
}

/// Reporter that logs events through `tracing`
///
/// Completed pages and files are logged at info level with the running
/// `completed/total` counter. Skips and retryable failures only show up at
/// debug level, so a flaky address just makes a quiet run take longer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: ProgressEvent<'_>) {
        match event {
            ProgressEvent::RoundStarted {
                round,
                batch_size,
                progress,
            } => {
                tracing::debug!(
                    "Round {}: dispatching {} addresses ({}/{} done)",
                    round,
                    batch_size,
                    progress.completed,
                    progress.total
                );
            }
            ProgressEvent::Completed {
                address,
                kind: ResourceKind::Skipped,
                ..
            } => {
                tracing::debug!("{} already mirrored", address);
            }
            ProgressEvent::Completed {
                address,
                kind,
                progress,
            } => {
                tracing::info!(
                    "[{}/{}] {} {}",
                    progress.completed,
                    progress.total,
                    kind.as_str(),
                    address
                );
            }
            ProgressEvent::Failed {
                address,
                reason,
                attempt,
            } => {
                tracing::debug!("Error in {} (attempt {}): {}", address, attempt, reason);
            }
            ProgressEvent::Abandoned {
                address,
                reason,
                attempts,
            } => {
                tracing::warn!(
                    "Giving up on {} after {} attempts: {}",
                    address,
                    attempts,
                    reason
                );
            }
            ProgressEvent::CheckpointSaved { path, progress } => {
                tracing::info!(
                    "Saved progress to {} ({}/{} done)",
                    path.display(),
                    progress.completed,
                    progress.total
                );
            }
        }
    }
}
