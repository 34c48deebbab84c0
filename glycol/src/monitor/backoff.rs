//! Exponential backoff after failed polls.
//!
//! ```text
//! failure 1 ──► initial
//! failure 2 ──► initial × 2
//! failure n ──► min(initial × 2^(n-1), max)
//! success   ──► reset
//! ```
//!
//! A server-provided retry-after always wins when it is longer.

use std::time::Duration;

use crate::config::{DEFAULT_BACKOFF_INITIAL_SECS, DEFAULT_BACKOFF_MAX_SECS};

/// Backoff delay bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(DEFAULT_BACKOFF_INITIAL_SECS),
            max: Duration::from_secs(DEFAULT_BACKOFF_MAX_SECS),
        }
    }
}

impl BackoffConfig {
    /// Creates bounds; `max` is raised to `initial` if smaller.
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
        }
    }
}

/// Backoff state for one monitoring session.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    current: Option<Duration>,
    failures: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            current: None,
            failures: 0,
        }
    }

    /// Registers a failure and returns how long to wait.
    pub fn next_delay(&mut self, retry_after: Option<Duration>) -> Duration {
        let delay = match self.current {
            None => self.config.initial,
            Some(previous) => previous.saturating_mul(2).min(self.config.max),
        };
        self.current = Some(delay);
        self.failures = self.failures.saturating_add(1);

        delay.max(retry_after.unwrap_or(Duration::ZERO))
    }

    /// Clears the failure streak.
    pub fn reset(&mut self) {
        if self.failures > 0 {
            tracing::debug!(failures = self.failures, "Backoff reset");
        }
        self.current = None;
        self.failures = 0;
    }

    /// Consecutive failures since the last success.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Whether the last poll failed.
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_doubles_up_to_cap() {
        let mut backoff = Backoff::new(BackoffConfig::default());
        let delays: Vec<_> = (0..7).map(|_| backoff.next_delay(None)).collect();
        assert_eq!(
            delays,
            vec![secs(10), secs(20), secs(40), secs(80), secs(160), secs(300), secs(300)]
        );
        assert_eq!(backoff.failures(), 7);
    }

    #[test]
    fn test_retry_after_is_a_floor() {
        let mut backoff = Backoff::new(BackoffConfig::default());
        assert_eq!(backoff.next_delay(Some(secs(45))), secs(45));
        // The doubling sequence continues from its own value.
        assert_eq!(backoff.next_delay(Some(secs(1))), secs(20));
    }

    #[test]
    fn test_reset() {
        let mut backoff = Backoff::new(BackoffConfig::default());
        backoff.next_delay(None);
        backoff.next_delay(None);
        assert!(backoff.is_active());

        backoff.reset();
        assert!(!backoff.is_active());
        assert_eq!(backoff.failures(), 0);
        assert_eq!(backoff.next_delay(None), secs(10));
    }

    #[test]
    fn test_config_max_not_below_initial() {
        let config = BackoffConfig::new(secs(30), secs(5));
        assert_eq!(config.max, secs(30));
    }
}
