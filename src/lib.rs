//! Mirror-Crawl: a recursive site mirroring crawler
//!
//! This crate crawls a website from a root address, follows hyperlinks found
//! inside an optional container element, and mirrors every non-page resource
//! into a local directory tree. Crawl state can be checkpointed and resumed.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Mirror-Crawl operations
///
/// Per-address network and parse failures are not errors; they are reported
/// as [`crawler::DownloadOutcome::RetryableFailure`]. Anything surfacing as a
/// `MirrorError` aborts the run.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Address cannot be mirrored to a local path: {0}")]
    Unmirrorable(String),

    #[error("Invalid run transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunPhase,
        to: state::RunPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse cookies: {0}")]
    Cookies(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Checkpoint loading and saving errors
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Checkpoint is truncated: missing {0}")]
    Truncated(&'static str),

    #[error("Checkpoint {section} is malformed: {source}")]
    Malformed {
        section: &'static str,
        source: serde_json::Error,
    },

    #[error("Unsupported checkpoint format {format:?} version {version}")]
    UnsupportedVersion { format: String, version: u32 },

    #[error("Checkpoint checksum mismatch (expected {expected}, found {actual})")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Failed to encode checkpoint: {0}")]
    Encode(serde_json::Error),
}

/// Result type alias for Mirror-Crawl operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for checkpoint operations
pub type CheckpointResult<T> = std::result::Result<T, CheckpointError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, Coordinator, DownloadOutcome, RunReport, TerminationReason};
pub use state::{CompletedRegistry, CrawlState, Frontier, RunPhase};
