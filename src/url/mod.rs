//! URL handling module for Mirror-Crawl
//!
//! This module provides link resolution, the loop-prevention link filters,
//! and the mapping from an address to its mirrored location on disk.

pub mod filter;
mod mirror;
mod resolve;

// Re-export main functions
pub use filter::should_follow;
pub use mirror::{mirror_path, DIRECTORY_INDEX};
pub use resolve::resolve_link;
