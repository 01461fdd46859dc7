//! Crawler coordinator - main run orchestration logic
//!
//! This module contains the top-level run loop, including:
//! - Restoring state from a checkpoint or seeding it with the root address
//! - Driving scheduler rounds until the frontier is empty
//! - Periodic checkpoints every `backup-interval` completions
//! - Draining on interrupt and asking whether to save progress

use crate::config::{validate, Config};
use crate::crawler::dispatcher::{ContentDispatcher, Dispatch};
use crate::crawler::scheduler::{RetryPolicy, RoundSummary, Scheduler};
use crate::output::{ProgressEvent, ProgressReporter, TracingReporter};
use crate::state::{CrawlState, RunPhase};
use crate::storage::{load_checkpoint, save_state};
use crate::{MirrorError, Result};
use tokio::sync::watch;

/// Decides whether progress is saved after an interrupt
pub trait InterruptPrompt {
    /// Returns true to write a final checkpoint
    fn confirm_save(&mut self) -> bool;
}

impl<F: FnMut() -> bool> InterruptPrompt for F {
    fn confirm_save(&mut self) -> bool {
        self()
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The frontier was exhausted
    Completed,
    /// Interrupted, and a final checkpoint was written
    InterruptedAndSaved,
    /// Interrupted, and the in-memory state was discarded
    InterruptedAndDiscarded,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::InterruptedAndSaved => "interrupted-and-saved",
            Self::InterruptedAndDiscarded => "interrupted-and-discarded",
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final counts of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub reason: TerminationReason,
    /// Completed addresses, including those restored from a checkpoint
    pub completed: u64,
    /// Addresses still pending when the run ended
    pub pending: u64,
    /// Pages processed during this run
    pub pages: u64,
    /// Files written during this run
    pub files_written: u64,
    /// Files already present and skipped during this run
    pub files_skipped: u64,
    /// Addresses given up on after too many failures
    pub abandoned: u64,
    pub rounds: u64,
    /// True if the run started from a checkpoint
    pub resumed: bool,
}

/// Main run coordinator
///
/// Owns the crawl state and the scheduler, and moves through
/// `Init -> (Resuming | Seeding) -> Running -> (Draining)? -> Terminated`.
pub struct Coordinator<D = ContentDispatcher> {
    config: Config,
    state: CrawlState,
    scheduler: Scheduler<D>,
    phase: RunPhase,
    reporter: Box<dyn ProgressReporter>,
    interrupt: watch::Receiver<bool>,
    resumed: bool,
    since_backup: u64,
}

impl Coordinator<ContentDispatcher> {
    /// Creates a coordinator that fetches over HTTP
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - State seeded or restored, ready to run
    /// * `Err(MirrorError)` - Invalid configuration or unreadable checkpoint
    pub fn new(config: Config) -> Result<Self> {
        let dispatcher = ContentDispatcher::new(&config)?;
        Self::with_dispatcher(config, dispatcher)
    }
}

impl<D: Dispatch> Coordinator<D> {
    /// Creates a coordinator around an arbitrary dispatcher
    pub fn with_dispatcher(config: Config, dispatcher: D) -> Result<Self> {
        validate(&config)?;

        let mut phase = RunPhase::Init;
        let prevent_loops = config.crawl.prevent_loops;
        let mut restored = None;

        if config.checkpoint.resume {
            advance(&mut phase, RunPhase::Resuming)?;
            let path = config.checkpoint_path();
            match load_checkpoint(&path)? {
                Some(checkpoint) => {
                    tracing::info!(
                        "Resuming from {} ({} completed, {} pending, saved {})",
                        path.display(),
                        checkpoint.completed_count,
                        checkpoint.frontier.len(),
                        checkpoint.saved_at.to_rfc3339()
                    );
                    restored = Some(checkpoint.into_state(prevent_loops));
                }
                None => {
                    tracing::info!("No checkpoint at {}, starting fresh", path.display());
                }
            }
        }

        let resumed = restored.is_some();
        let state = match restored {
            Some(state) => state,
            None => {
                advance(&mut phase, RunPhase::Seeding)?;
                let root = config.crawl.root_address();
                tracing::debug!("Seeding frontier with {}", root);
                CrawlState::seeded(&root, prevent_loops)
            }
        };

        let scheduler = Scheduler::new(
            dispatcher,
            config.crawl.concurrency,
            RetryPolicy::limited(config.crawl.max_retries),
        );

        // The sender is dropped right away, so the flag stays false
        let (_, interrupt) = watch::channel(false);

        Ok(Self {
            config,
            state,
            scheduler,
            phase,
            reporter: Box::new(TracingReporter),
            interrupt,
            resumed,
            since_backup: 0,
        })
    }

    /// Replaces the progress reporter
    pub fn with_reporter(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Sets the interrupt flag checked between rounds
    pub fn with_interrupt(mut self, interrupt: watch::Receiver<bool>) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Runs rounds until the frontier is empty or an interrupt arrives
    ///
    /// An interrupt lets the current round finish, then asks `prompt`
    /// whether to save. A fatal error writes a checkpoint of the reconciled
    /// state before it is returned.
    pub async fn run(&mut self, prompt: &mut dyn InterruptPrompt) -> Result<RunReport> {
        self.transition(RunPhase::Running)?;
        tracing::info!(
            "Mirroring {} into {} ({} concurrent)",
            self.config.crawl.root_url,
            self.config.output.download_path.display(),
            self.scheduler.concurrency()
        );

        let mut totals = RoundSummary::default();

        while !self.state.is_finished() {
            if self.interrupted() {
                return self.drain(prompt, &totals);
            }

            let round = match self
                .scheduler
                .run_round(&mut self.state, self.reporter.as_ref())
                .await
            {
                Ok(round) => round,
                Err(e) => return Err(self.abort(e)),
            };
            totals.absorb(&round);

            self.since_backup += round.succeeded();
            let interval = self.config.checkpoint.backup_interval;
            if interval > 0 && self.since_backup >= interval {
                self.save()?;
                self.since_backup = 0;
            }
        }

        self.transition(RunPhase::Terminated)?;
        tracing::info!(
            "Crawl completed: {} addresses in {} rounds",
            self.state.completed_count,
            self.scheduler.rounds()
        );
        Ok(self.report(TerminationReason::Completed, &totals))
    }

    fn interrupted(&self) -> bool {
        *self.interrupt.borrow()
    }

    fn drain(
        &mut self,
        prompt: &mut dyn InterruptPrompt,
        totals: &RoundSummary,
    ) -> Result<RunReport> {
        self.transition(RunPhase::Draining)?;
        tracing::warn!(
            "Interrupted with {} addresses pending",
            self.state.frontier.len()
        );

        let reason = if prompt.confirm_save() {
            self.save()?;
            TerminationReason::InterruptedAndSaved
        } else {
            tracing::info!("Discarding progress");
            TerminationReason::InterruptedAndDiscarded
        };

        self.transition(RunPhase::Terminated)?;
        Ok(self.report(reason, totals))
    }

    /// Saves the reconciled state after a fatal error and hands the error back
    fn abort(&mut self, error: MirrorError) -> MirrorError {
        if let Err(save_error) = self.save() {
            tracing::error!("Could not save progress before aborting: {}", save_error);
        }
        if let Err(transition_error) = self.transition(RunPhase::Terminated) {
            tracing::error!("{}", transition_error);
        }
        error
    }

    fn save(&self) -> Result<()> {
        let path = self.config.checkpoint_path();
        save_state(&path, &self.state)?;
        self.reporter.report(ProgressEvent::CheckpointSaved {
            path: &path,
            progress: self.state.progress(),
        });
        Ok(())
    }

    fn transition(&mut self, next: RunPhase) -> Result<()> {
        advance(&mut self.phase, next)
    }

    fn report(&self, reason: TerminationReason, totals: &RoundSummary) -> RunReport {
        RunReport {
            reason,
            completed: self.state.completed_count,
            pending: self.state.frontier.len() as u64,
            pages: totals.pages,
            files_written: totals.files_written,
            files_skipped: totals.files_skipped,
            abandoned: totals.abandoned,
            rounds: self.scheduler.rounds(),
            resumed: self.resumed,
        }
    }
}

fn advance(phase: &mut RunPhase, next: RunPhase) -> Result<()> {
    if !phase.can_transition_to(next) {
        return Err(MirrorError::InvalidTransition {
            from: *phase,
            to: next,
        });
    }
    tracing::debug!("Run phase {} -> {}", phase, next);
    *phase = next;
    Ok(())
}

/// Listens for Ctrl+C and raises the interrupt flag
///
/// The first Ctrl+C lets the current round drain. A second one exits
/// immediately without saving.
fn spawn_interrupt_listener() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("Received Ctrl+C, finishing the current round (press again to force quit)");
        let _ = tx.send(true);

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::error!("Force quit requested, exiting without saving");
            std::process::exit(130);
        }
    });

    rx
}

/// Runs a complete mirror operation
///
/// This is the main entry point for a crawl. It will:
/// 1. Validate the configuration and build the HTTP client
/// 2. Restore the checkpoint if resuming, or seed the root address
/// 3. Run fetch rounds until the frontier is empty
/// 4. On Ctrl+C, drain the current round and ask `prompt` whether to save
///
/// # Example
///
/// ```no_run
/// use mirror_crawl::{crawl, Config};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::for_root("https://example.test/files/");
/// let report = crawl(config, &mut || true).await?;
/// println!("{} completed", report.completed);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config, prompt: &mut dyn InterruptPrompt) -> Result<RunReport> {
    let mut coordinator = Coordinator::new(config)?.with_interrupt(spawn_interrupt_listener());
    coordinator.run(prompt).await
}
