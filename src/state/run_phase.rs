/// Run controller phase definitions
///
/// A run moves `Init -> (Resuming | Seeding) -> Running -> (Draining)? -> Terminated`.
use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Nothing loaded yet
    Init,

    /// Restoring the frontier from a checkpoint
    Resuming,

    /// Starting from the root address only
    Seeding,

    /// Executing fetch rounds
    Running,

    /// Interrupted; the in-flight batch has settled and the save decision is pending
    Draining,

    /// Finished, successfully or not
    Terminated,
}

impl RunPhase {
    /// Returns true if moving from this phase to `next` is allowed
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        use RunPhase::*;

        matches!(
            (self, next),
            (Init, Resuming)
                | (Init, Seeding)
                | (Resuming, Seeding)
                | (Resuming, Running)
                | (Seeding, Running)
                | (Running, Draining)
                | (Running, Terminated)
                | (Draining, Terminated)
        )
    }

    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Resuming => "resuming",
            Self::Seeding => "seeding",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
