use crate::state::{CompletedRegistry, Frontier};

/// Progress counters used for reporting only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// Addresses completed so far
    pub completed: u64,
    /// Addresses ever discovered (pending + completed)
    pub total: u64,
}

/// The mutable crawl state shared by the scheduler and the checkpoint manager
///
/// When loop prevention is enabled, an address is never in both the frontier
/// and the completed registry.
#[derive(Debug, Clone)]
pub struct CrawlState {
    pub frontier: Frontier,
    pub completed: CompletedRegistry,
    pub completed_count: u64,
    prevent_loops: bool,
}

impl CrawlState {
    /// Fresh state with only the root address pending
    pub fn seeded(root: &str, prevent_loops: bool) -> Self {
        let mut frontier = Frontier::new();
        frontier.push(root);
        Self {
            frontier,
            completed: CompletedRegistry::new(),
            completed_count: 0,
            prevent_loops,
        }
    }

    /// State rebuilt from a checkpoint
    pub fn restored(
        frontier: Frontier,
        completed: CompletedRegistry,
        completed_count: u64,
        prevent_loops: bool,
    ) -> Self {
        let mut state = Self {
            frontier,
            completed,
            completed_count,
            prevent_loops,
        };

        if prevent_loops {
            let stale: Vec<String> = state
                .frontier
                .iter()
                .filter(|address| state.completed.contains(address))
                .map(str::to_string)
                .collect();
            for address in stale {
                tracing::debug!("Dropping already completed {} from frontier", address);
                state.frontier.remove(&address);
            }
        }

        state
    }

    pub fn prevent_loops(&self) -> bool {
        self.prevent_loops
    }

    /// Offers a newly discovered link to the frontier
    ///
    /// Returns true if the link was added. Links already completed are
    /// discarded when loop prevention is on; links already pending are
    /// left where they are.
    pub fn discover(&mut self, link: &str) -> bool {
        if self.prevent_loops && self.completed.contains(link) {
            tracing::trace!("Discarding {}: already completed", link);
            return false;
        }
        self.frontier.push(link)
    }

    /// Records a successful completion of an address
    pub fn mark_completed(&mut self, address: &str) {
        self.frontier.remove(address);
        self.completed_count += 1;
        if self.prevent_loops {
            self.completed.insert(address);
        }
    }

    /// Records an address given up on after too many failures
    ///
    /// Abandoned addresses do not count as completed.
    pub fn mark_abandoned(&mut self, address: &str) {
        self.frontier.remove(address);
        if self.prevent_loops {
            self.completed.insert(address);
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.completed_count,
            total: self.completed_count + self.frontier.len() as u64,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.frontier.is_empty()
    }
}
