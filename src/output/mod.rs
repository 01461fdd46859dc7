//! Output module for progress events and run reports
//!
//! This module handles:
//! - Progress events emitted while a run is in flight
//! - Rendering the final run report

mod progress;
mod report;

pub use progress::{ProgressEvent, ProgressReporter, SilentReporter, TracingReporter};
pub use report::{format_report, print_report};
