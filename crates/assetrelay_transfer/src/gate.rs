//! Backpressure against the downstream processor.
//!
//! The processor renames what it has consumed so the name carries a marker
//! (`.hist` by default). Anything in the destination without the marker is
//! backlog, and no more files are sent until the backlog is gone.

use crate::cancel::CancellationToken;
use crate::error::{RelayError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const DEFAULT_PROCESSED_MARKER: &str = ".hist";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Blocks the transfer until the destination has drained.
pub trait BacklogGate: Send + Sync {
    fn wait_until_clear(&self, cancel: &CancellationToken) -> Result<()>;
}

/// Polling behaviour of a [`DirectoryGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    pub poll_interval: Duration,
    /// `None` waits for as long as it takes.
    pub max_wait: Option<Duration>,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
        }
    }
}

/// Polls a destination directory for unprocessed entries.
#[derive(Debug, Clone)]
pub struct DirectoryGate {
    dir: PathBuf,
    marker: String,
    policy: GatePolicy,
}

impl DirectoryGate {
    pub fn new(dir: impl Into<PathBuf>, marker: impl Into<String>, policy: GatePolicy) -> Self {
        Self {
            dir: dir.into(),
            marker: marker.into(),
            policy,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Destination entries whose name lacks the processed marker.
    pub fn pending_entries(&self) -> Result<Vec<PathBuf>> {
        let mut pending = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_name().to_string_lossy().contains(&self.marker) {
                pending.push(entry.path());
            }
        }
        pending.sort();
        Ok(pending)
    }
}

impl BacklogGate for DirectoryGate {
    fn wait_until_clear(&self, cancel: &CancellationToken) -> Result<()> {
        let start = Instant::now();
        let mut polls: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(RelayError::Cancelled);
            }

            let pending = self.pending_entries()?;
            polls += 1;
            if pending.is_empty() {
                tracing::debug!(polls, dir = %self.dir.display(), "destination clear");
                return Ok(());
            }

            if polls == 1 {
                tracing::info!(
                    pending = pending.len(),
                    dir = %self.dir.display(),
                    "waiting for downstream processor to drain destination"
                );
            } else {
                tracing::debug!(pending = pending.len(), polls, "destination still busy");
            }

            if let Some(max_wait) = self.policy.max_wait {
                if start.elapsed() >= max_wait {
                    return Err(RelayError::TimedOut {
                        pending: pending.len(),
                        waited_secs: start.elapsed().as_secs(),
                    });
                }
            }

            if !cancel.sleep(self.policy.poll_interval) {
                return Err(RelayError::Cancelled);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fast_policy() -> GatePolicy {
        GatePolicy {
            poll_interval: Duration::from_millis(10),
            max_wait: None,
        }
    }

    #[test]
    fn test_empty_destination_is_clear() {
        let temp = TempDir::new().unwrap();
        let gate = DirectoryGate::new(temp.path(), ".hist", fast_policy());
        gate.wait_until_clear(&CancellationToken::new()).unwrap();
    }

    #[test]
    fn test_every_entry_must_carry_marker() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.gh5.hist"), "").unwrap();
        fs::write(temp.path().join("b.gh5"), "").unwrap();
        fs::write(temp.path().join("c.gh5.hist"), "").unwrap();

        let gate = DirectoryGate::new(temp.path(), ".hist", fast_policy());
        let pending = gate.pending_entries().unwrap();
        assert_eq!(pending, vec![temp.path().join("b.gh5")]);
    }

    #[test]
    fn test_marked_only_destination_is_clear() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.gh5.hist"), "").unwrap();
        let gate = DirectoryGate::new(temp.path(), ".hist", fast_policy());
        gate.wait_until_clear(&CancellationToken::new()).unwrap();
    }

    #[test]
    fn test_times_out_when_bounded() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("stuck.gh5"), "").unwrap();
        let gate = DirectoryGate::new(
            temp.path(),
            ".hist",
            GatePolicy {
                poll_interval: Duration::from_millis(10),
                max_wait: Some(Duration::from_millis(50)),
            },
        );

        let err = gate.wait_until_clear(&CancellationToken::new()).unwrap_err();
        assert!(matches!(err, RelayError::TimedOut { pending: 1, .. }), "got {err:?}");
    }

    #[test]
    fn test_cancelled_wait_fails() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("stuck.gh5"), "").unwrap();
        let gate = DirectoryGate::new(temp.path(), ".hist", fast_policy());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = gate.wait_until_clear(&cancel).unwrap_err();
        assert!(matches!(err, RelayError::Cancelled));
    }

    #[test]
    fn test_missing_destination_is_an_error() {
        let temp = TempDir::new().unwrap();
        let gate = DirectoryGate::new(temp.path().join("gone"), ".hist", fast_policy());
        let err = gate.wait_until_clear(&CancellationToken::new()).unwrap_err();
        assert!(matches!(err, RelayError::Io(_)));
    }
}
