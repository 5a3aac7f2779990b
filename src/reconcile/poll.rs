//! Polling configuration for the reconciliation loop.
//!
//! The tab-bar is rendered asynchronously, so an attempt that finds nothing is
//! expected and retried on a timer. Together the two knobs bound how long one
//! epoch keeps looking before it gives up and waits for the next signal.
//!
//! # Defaults
//!
//! - **Poll interval**: 300 ms (configurable via `TAB_RECONCILER_POLL_INTERVAL_MS`)
//! - **Retry limit**: 25 attempts (configurable via `TAB_RECONCILER_RETRY_LIMIT`)
//!
//! That gives a give-up horizon of roughly 7.5 seconds per epoch.

use std::time::Duration;

/// Default delay between attempts within one epoch (300 ms).
const DEFAULT_POLL_INTERVAL_MS: u64 = 300;

/// Default number of attempts per epoch before giving up.
const DEFAULT_RETRY_LIMIT: u32 = 25;

/// Configuration for per-epoch polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between a failed attempt and the next one for the same epoch.
    pub poll_interval: Duration,

    /// Total number of attempts one epoch may make before giving up.
    ///
    /// Must be at least 1.
    pub retry_limit: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PollConfig {
    /// Creates a new `PollConfig` with default values.
    pub fn new() -> Self {
        PollConfig {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }

    /// Creates a `PollConfig` from environment variables.
    ///
    /// Unset or unparsable values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a `PollConfig` from an arbitrary key lookup.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::new().overlay_lookup(lookup)
    }

    /// Overrides fields whose keys are present and parse; others keep their value.
    pub(crate) fn overlay_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(ms) = lookup("TAB_RECONCILER_POLL_INTERVAL_MS")
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            self.poll_interval = Duration::from_millis(ms);
        }

        if let Some(limit) = lookup("TAB_RECONCILER_RETRY_LIMIT")
            .and_then(|s| s.trim().parse::<u32>().ok())
        {
            self.retry_limit = limit;
        }

        self
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the retry limit.
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// Upper bound on the time from an epoch's first attempt to giving up.
    ///
    /// The last attempt runs one poll interval before this.
    pub fn give_up_horizon(&self) -> Duration {
        self.poll_interval * self.retry_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = PollConfig::new();

        assert_eq!(config.poll_interval, Duration::from_millis(300));
        assert_eq!(config.retry_limit, 25);
        assert_eq!(config.give_up_horizon(), Duration::from_millis(7500));
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = PollConfig::from_lookup(lookup_from(&[
            ("TAB_RECONCILER_POLL_INTERVAL_MS", "50"),
            ("TAB_RECONCILER_RETRY_LIMIT", " 4 "),
        ]));

        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.retry_limit, 4);
    }

    #[test]
    fn unparsable_values_fall_back() {
        let config = PollConfig::from_lookup(lookup_from(&[
            ("TAB_RECONCILER_POLL_INTERVAL_MS", "soon"),
            ("TAB_RECONCILER_RETRY_LIMIT", "-1"),
        ]));

        assert_eq!(config, PollConfig::new());
    }
}
