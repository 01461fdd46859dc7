//! Crawler module for fetching, dispatching, and scheduling addresses
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a shared client
//! - HTML parsing and container-scoped link extraction
//! - Page-or-file dispatch per address
//! - Batch scheduling with a barrier between rounds
//! - Overall run coordination and interrupt handling

mod coordinator;
mod dispatcher;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{crawl, Coordinator, InterruptPrompt, RunReport, TerminationReason};
pub use dispatcher::{ContentDispatcher, Dispatch, DownloadOutcome, ResourceKind};
pub use fetcher::{build_http_client, fetch_url, is_html, FetchResult};
pub use parser::{parse_html, ExtractedLink, ParsedPage};
pub use scheduler::{RetryPolicy, RoundSummary, Scheduler};
