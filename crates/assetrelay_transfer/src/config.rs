//! Configuration for Asset Relay

use crate::error::{RelayError, Result};
use crate::gate::{GatePolicy, DEFAULT_PROCESSED_MARKER};
use crate::oracle::DateSource;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Written when no configuration file exists yet. The placeholder paths do
/// not exist, so a template that was never edited fails validation.
pub const CONFIG_TEMPLATE: &str = r#"# Asset Relay configuration

# Directory holding the dated asset files.
source_dir = "/path/to/source"

# Directory read by the downstream processor.
destination_dir = "/path/to/destination"

# Single-file copies allowed before waiting for the destination to drain.
throttle_threshold = 5

# Destination entries whose name contains this marker count as processed.
processed_marker = ".hist"

# Seconds between destination polls.
poll_interval_secs = 2

# Give up waiting for the destination after this many seconds (unset = wait forever).
# max_wait_secs = 3600

# Where entry dates come from: "name" or "name_or_modified".
date_source = "name"

# Command run after a successful transfer (optional).
# notify_command = ["/usr/local/bin/open-ticket", "--queue", "assets"]
"#;

/// Main configuration for Asset Relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Directory holding the dated asset files
    pub source_dir: PathBuf,

    /// Directory read by the downstream processor
    pub destination_dir: PathBuf,

    /// Single-file copies allowed between backlog waits
    #[serde(default = "default_throttle_threshold")]
    pub throttle_threshold: usize,

    /// Name fragment the downstream processor adds once an entry is handled
    #[serde(default = "default_processed_marker")]
    pub processed_marker: String,

    /// Destination polling interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Upper bound on a single backlog wait
    #[serde(default)]
    pub max_wait_secs: Option<u64>,

    #[serde(default)]
    pub date_source: DateSource,

    /// Command (program + arguments) run after a successful transfer
    #[serde(default)]
    pub notify_command: Option<Vec<String>>,
}

fn default_throttle_threshold() -> usize {
    5
}

fn default_processed_marker() -> String {
    DEFAULT_PROCESSED_MARKER.to_string()
}

fn default_poll_interval() -> u64 {
    2
}

impl RelayConfig {
    pub fn new(source_dir: impl Into<PathBuf>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            destination_dir: destination_dir.into(),
            throttle_threshold: default_throttle_threshold(),
            processed_marker: default_processed_marker(),
            poll_interval_secs: default_poll_interval(),
            max_wait_secs: None,
            date_source: DateSource::default(),
            notify_command: None,
        }
    }

    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: RelayConfig =
            toml::from_str(&content).map_err(|e| RelayError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, writing [`CONFIG_TEMPLATE`] first if the file is
    /// missing. A freshly written template is reported as an error: it has
    /// to be filled in before the first run.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            write_template(path)?;
            return Err(RelayError::Config(format!(
                "no configuration found; a template was written to {}, fill it in and retry",
                path.display()
            )));
        }
        Self::load(path)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| RelayError::Config(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.throttle_threshold == 0 {
            return Err(RelayError::Config(
                "throttle_threshold must be a positive integer".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(RelayError::Config(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.processed_marker.is_empty() {
            return Err(RelayError::Config(
                "processed_marker must not be empty".to_string(),
            ));
        }
        if matches!(&self.notify_command, Some(argv) if argv.is_empty()) {
            return Err(RelayError::Config(
                "notify_command must name a program".to_string(),
            ));
        }
        for (key, dir) in [
            ("source_dir", &self.source_dir),
            ("destination_dir", &self.destination_dir),
        ] {
            if !dir.is_dir() {
                return Err(RelayError::Config(format!(
                    "{key} '{}' is not an existing directory",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    pub fn throttle(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.throttle_threshold).ok_or_else(|| {
            RelayError::Config("throttle_threshold must be a positive integer".to_string())
        })
    }

    pub fn gate_policy(&self) -> GatePolicy {
        GatePolicy {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_wait: self.max_wait_secs.map(Duration::from_secs),
        }
    }
}

/// Write the commented template to `path`, creating parent directories.
pub fn write_template(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, CONFIG_TEMPLATE)?;
    tracing::info!(path = %path.display(), "wrote configuration template");
    Ok(())
}
