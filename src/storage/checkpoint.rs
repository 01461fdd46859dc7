//! Checkpoint persistence for crash-resilient resumption
//!
//! A checkpoint is the triple {frontier, completed registry, completed count}
//! written as one unit. The file is JSON lines:
//!
//! ```text
//! {"format":"mirror-crawl-checkpoint","version":1,"saved_at":"...","checksum":"..."}
//! {"https://example.test/sub/":true,"https://example.test/a.txt":true}
//! {"https://example.test/":true}
//! 1
//! ```
//!
//! The checksum is the SHA-256 of the three record lines, so a truncated or
//! edited file is rejected instead of silently resuming from partial state.
//! Saves go to a temporary file that is then renamed over the target.

use crate::state::{CompletedRegistry, CrawlState, Frontier};
use crate::{CheckpointError, CheckpointResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Identifies checkpoint files written by this crate
pub const CHECKPOINT_FORMAT: &str = "mirror-crawl-checkpoint";

/// Current checkpoint layout version
pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointHeader {
    format: String,
    version: u32,
    saved_at: DateTime<Utc>,
    checksum: String,
}

/// A restored checkpoint
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub frontier: Frontier,
    pub completed: CompletedRegistry,
    pub completed_count: u64,
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Converts the checkpoint into live crawl state
    pub fn into_state(self, prevent_loops: bool) -> CrawlState {
        CrawlState::restored(
            self.frontier,
            self.completed,
            self.completed_count,
            prevent_loops,
        )
    }
}

/// Saves the crawl state triple to `path`
///
/// # Arguments
///
/// * `path` - Destination file; its parent directory is created if needed
/// * `frontier` - Pending addresses, in traversal order
/// * `completed` - Completed registry
/// * `completed_count` - Number of successful completions so far
pub fn save_checkpoint(
    path: &Path,
    frontier: &Frontier,
    completed: &CompletedRegistry,
    completed_count: u64,
) -> CheckpointResult<()> {
    debug!("Saving checkpoint to {:?}", path);

    let body = encode_body(frontier, completed, completed_count)?;
    let header = CheckpointHeader {
        format: CHECKPOINT_FORMAT.to_string(),
        version: CHECKPOINT_VERSION,
        saved_at: Utc::now(),
        checksum: checksum(&body),
    };
    let header_line = serde_json::to_string(&header).map_err(CheckpointError::Encode)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| CheckpointError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, format!("{}\n{}", header_line, body)).map_err(|source| {
        CheckpointError::Io {
            path: tmp_path.clone(),
            source,
        }
    })?;
    fs::rename(&tmp_path, path).map_err(|source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        "Checkpoint written: {} pending, {} completed",
        frontier.len(),
        completed_count
    );
    Ok(())
}

/// Saves a [`CrawlState`] as a checkpoint
pub fn save_state(path: &Path, state: &CrawlState) -> CheckpointResult<()> {
    save_checkpoint(
        path,
        &state.frontier,
        &state.completed,
        state.completed_count,
    )
}

/// Loads a checkpoint from `path`
///
/// # Returns
///
/// * `Ok(Some(Checkpoint))` - Checkpoint restored
/// * `Ok(None)` - No checkpoint exists at `path`
/// * `Err(CheckpointError)` - The file exists but cannot be trusted
pub fn load_checkpoint(path: &Path) -> CheckpointResult<Option<Checkpoint>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(CheckpointError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let (header_line, body) = content
        .split_once('\n')
        .ok_or(CheckpointError::Truncated("header"))?;

    let header: CheckpointHeader =
        serde_json::from_str(header_line).map_err(|source| CheckpointError::Malformed {
            section: "header",
            source,
        })?;

    if header.format != CHECKPOINT_FORMAT || header.version != CHECKPOINT_VERSION {
        return Err(CheckpointError::UnsupportedVersion {
            format: header.format,
            version: header.version,
        });
    }

    let mut lines = body.lines();
    let frontier_line = lines.next().ok_or(CheckpointError::Truncated("frontier"))?;
    let completed_line = lines
        .next()
        .ok_or(CheckpointError::Truncated("completed registry"))?;
    let count_line = lines
        .next()
        .ok_or(CheckpointError::Truncated("completed count"))?;

    let actual = checksum(body);
    if actual != header.checksum {
        return Err(CheckpointError::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }

    let frontier: Frontier =
        serde_json::from_str(frontier_line).map_err(|source| CheckpointError::Malformed {
            section: "frontier",
            source,
        })?;
    let completed: CompletedRegistry =
        serde_json::from_str(completed_line).map_err(|source| CheckpointError::Malformed {
            section: "completed registry",
            source,
        })?;
    let completed_count: u64 =
        serde_json::from_str(count_line).map_err(|source| CheckpointError::Malformed {
            section: "completed count",
            source,
        })?;

    debug!(
        "Loaded checkpoint saved at {}: {} pending, {} completed",
        header.saved_at,
        frontier.len(),
        completed_count
    );

    Ok(Some(Checkpoint {
        frontier,
        completed,
        completed_count,
        saved_at: header.saved_at,
    }))
}

fn encode_body(
    frontier: &Frontier,
    completed: &CompletedRegistry,
    completed_count: u64,
) -> CheckpointResult<String> {
    let frontier = serde_json::to_string(frontier).map_err(CheckpointError::Encode)?;
    let completed = serde_json::to_string(completed).map_err(CheckpointError::Encode)?;
    Ok(format!("{}\n{}\n{}\n", frontier, completed, completed_count))
}

fn checksum(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_state() -> (Frontier, CompletedRegistry, u64) {
        let frontier: Frontier = [
            "https://example.test/z/",
            "https://example.test/a.txt",
            "https://example.test/m.bin",
        ]
        .into_iter()
        .collect();
        let completed: CompletedRegistry = ["https://example.test/", "https://example.test/x/"]
            .into_iter()
            .collect();
        (frontier, completed, 7)
    }

    #[test]
    fn test_round_trip_preserves_order_and_membership() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let (frontier, completed, count) = sample_state();

        save_checkpoint(&path, &frontier, &completed, count).unwrap();
        let loaded = load_checkpoint(&path).unwrap().unwrap();

        assert_eq!(
            loaded.frontier.iter().collect::<Vec<_>>(),
            frontier.iter().collect::<Vec<_>>()
        );
        assert_eq!(loaded.completed, completed);
        assert_eq!(loaded.completed_count, count);
    }

    #[test]
    fn test_missing_checkpoint_is_none() {
        let dir = tempdir().unwrap();
        let loaded = load_checkpoint(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_creates_parent_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("progress.json");
        let (frontier, completed, count) = sample_state();

        save_checkpoint(&path, &frontier, &completed, count).unwrap();

        assert!(path.is_file());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_save_overwrites_previous_checkpoint() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let (frontier, completed, _) = sample_state();

        save_checkpoint(&path, &frontier, &completed, 1).unwrap();
        save_checkpoint(&path, &Frontier::new(), &completed, 2).unwrap();

        let loaded = load_checkpoint(&path).unwrap().unwrap();
        assert!(loaded.frontier.is_empty());
        assert_eq!(loaded.completed_count, 2);
    }

    #[test]
    fn test_truncated_checkpoint_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let (frontier, completed, count) = sample_state();
        save_checkpoint(&path, &frontier, &completed, count).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        fs::write(&path, format!("{}\n{}\n", lines[0], lines[1])).unwrap();

        assert!(matches!(
            load_checkpoint(&path),
            Err(CheckpointError::Truncated(_))
        ));

        fs::write(&path, &content[..content.len() - 1]).unwrap();
        assert!(matches!(
            load_checkpoint(&path),
            Err(CheckpointError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_tampered_checkpoint_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let (frontier, completed, _) = sample_state();
        save_checkpoint(&path, &frontier, &completed, 7).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let tampered = content.replace("\n7\n", "\n8\n");
        fs::write(&path, tampered).unwrap();

        assert!(matches!(
            load_checkpoint(&path),
            Err(CheckpointError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(
            &path,
            r#"{"format":"mirror-crawl-checkpoint","version":99,"saved_at":"2024-01-01T00:00:00Z","checksum":""}
{}
{}
0
"#,
        )
        .unwrap();

        assert!(matches!(
            load_checkpoint(&path),
            Err(CheckpointError::UnsupportedVersion { version: 99, .. })
        ));
    }

    #[test]
    fn test_garbage_header_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, "\u{80}\u{04}pickle\n").unwrap();

        assert!(matches!(
            load_checkpoint(&path),
            Err(CheckpointError::Malformed {
                section: "header",
                ..
            })
        ));
    }

    #[test]
    fn test_save_state_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let mut state = CrawlState::seeded("https://example.test/", true);
        state.frontier.pop_batch(1);
        state.mark_completed("https://example.test/");
        state.discover("https://example.test/a.txt");

        save_state(&path, &state).unwrap();
        let restored = load_checkpoint(&path).unwrap().unwrap().into_state(true);

        assert_eq!(restored.progress(), state.progress());
        assert!(restored.frontier.contains("https://example.test/a.txt"));
        assert!(restored.completed.contains("https://example.test/"));
    }
}
