//! Storage layer for Mirror-Crawl
//!
//! The only durable state is the checkpoint file holding the frontier, the
//! completed registry, and the completed count.

mod checkpoint;

pub use checkpoint::{
    load_checkpoint, save_checkpoint, save_state, Checkpoint, CHECKPOINT_FORMAT,
    CHECKPOINT_VERSION,
};
