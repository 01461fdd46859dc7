//! State module for tracking crawl progress
//!
//! This module provides the explicit crawl state passed between the
//! scheduler, the run controller, and the checkpoint manager.
//!
//! # Components
//!
//! - `Frontier`: Insertion-ordered pending addresses, popped most recent first
//! - `CompletedRegistry`: Addresses already processed (loop prevention)
//! - `CrawlState`: Frontier + registry + completed count as one unit
//! - `RunPhase`: Phases of the run controller

mod crawl_state;
mod frontier;
mod registry;
mod run_phase;

// Re-export main types
pub use crawl_state::{CrawlState, Progress};
pub use frontier::{Frontier, PendingAddress};
pub use registry::CompletedRegistry;
pub use run_phase::RunPhase;
