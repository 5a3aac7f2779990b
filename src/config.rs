//! Reconciler configuration.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional JSON file, and environment variables.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `TAB_RECONCILER_MONITORED_PATH` | route the tab-bar lives on | `/home` |
//! | `TAB_RECONCILER_TARGET_LABEL` | label of the desired tab | `Following` |
//! | `TAB_RECONCILER_POLL_INTERVAL_MS` | delay between attempts | `300` |
//! | `TAB_RECONCILER_RETRY_LIMIT` | attempts per epoch | `25` |

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::reconcile::PollConfig;

/// Default monitored route.
pub const DEFAULT_MONITORED_PATH: &str = "/home";

/// Default desired tab label.
pub const DEFAULT_TARGET_LABEL: &str = "Following";

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading a config file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for this schema.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The monitored path is not an absolute route.
    #[error("monitored path must start with '/': {0:?}")]
    InvalidPath(String),

    /// The target label is empty after trimming.
    #[error("target label must not be empty")]
    EmptyLabel,

    /// The retry limit would never allow an attempt.
    #[error("retry limit must be at least 1")]
    ZeroRetryLimit,
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Everything a reconciler needs to know about its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// The route on which the tab-bar is reconciled.
    pub monitored_path: String,

    /// The visible label of the desired tab.
    pub target_label: String,

    /// Polling behaviour per epoch.
    pub poll: PollConfig,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        ReconcilerConfig {
            monitored_path: DEFAULT_MONITORED_PATH.to_string(),
            target_label: DEFAULT_TARGET_LABEL.to_string(),
            poll: PollConfig::new(),
        }
    }
}

/// On-disk form of the configuration. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    monitored_path: Option<String>,
    target_label: Option<String>,
    poll_interval_ms: Option<u64>,
    retry_limit: Option<u32>,
}

impl ReconcilerConfig {
    /// Creates a configuration for `target_label` on `monitored_path` with
    /// default polling.
    pub fn new(monitored_path: impl Into<String>, target_label: impl Into<String>) -> Self {
        ReconcilerConfig {
            monitored_path: monitored_path.into(),
            target_label: target_label.into(),
            poll: PollConfig::new(),
        }
    }

    /// Sets the polling configuration.
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Loads defaults overridden by environment variables, then validates.
    pub fn from_env() -> Result<Self> {
        Self::default().overlay_lookup(|key| std::env::var(key).ok())
    }

    /// Loads a JSON config file over the defaults, then validates.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parses a JSON config document over the defaults, then validates.
    pub fn from_json(contents: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(contents)?;
        let mut config = Self::default();
        if let Some(path) = file.monitored_path {
            config.monitored_path = path;
        }
        if let Some(label) = file.target_label {
            config.target_label = label;
        }
        if let Some(ms) = file.poll_interval_ms {
            config.poll.poll_interval = Duration::from_millis(ms);
        }
        if let Some(limit) = file.retry_limit {
            config.poll.retry_limit = limit;
        }
        config.validate()?;
        Ok(config)
    }

    /// Applies environment variables on top of `self`, then validates.
    pub fn overlay_env(self) -> Result<Self> {
        self.overlay_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn overlay_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(path) = lookup("TAB_RECONCILER_MONITORED_PATH") {
            self.monitored_path = path;
        }
        if let Some(label) = lookup("TAB_RECONCILER_TARGET_LABEL") {
            self.target_label = label;
        }

        self.poll = self.poll.overlay_lookup(&lookup);

        self.validate()?;
        Ok(self)
    }

    /// Checks the configuration for values the reconciler cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.monitored_path.starts_with('/') {
            return Err(ConfigError::InvalidPath(self.monitored_path.clone()));
        }
        if self.target_label.trim().is_empty() {
            return Err(ConfigError::EmptyLabel);
        }
        if self.poll.retry_limit == 0 {
            return Err(ConfigError::ZeroRetryLimit);
        }
        Ok(())
    }
}
