//! Configuration module for Mirror-Crawl
//!
//! This module handles loading, parsing, and validating the crawl options,
//! either from a TOML file or assembled by the command-line front end.
//!
//! # Example
//!
//! ```no_run
//! use mirror_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Crawling with concurrency {}", config.crawl.concurrency);
//! ```

mod cookies;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CheckpointConfig, Config, CrawlConfig, HttpConfig, OutputConfig};

// Re-export parser functions
pub use cookies::{cookie_header, parse_cookies};
pub use parser::{load_config, parse_config};
pub use validation::{validate, MAX_CONCURRENCY};
