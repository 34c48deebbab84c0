//! Monitor configuration.

use std::time::Duration;

use crate::config::{ConfigError, ConfigFile};
use crate::coord::DEFAULT_RADIUS_NM;
use crate::tracker::TrackerConfig;

use super::backoff::BackoffConfig;

/// Shortest accepted poll interval, in seconds.
pub const MIN_INTERVAL_SECS: u64 = 5;

/// Longest accepted poll interval, in seconds.
pub const MAX_INTERVAL_SECS: u64 = 120;

/// Default capacity of the push-message broadcast channel.
pub const DEFAULT_MESSAGE_CAPACITY: usize = 256;

/// Default capacity of the command channel.
pub const DEFAULT_COMMAND_CAPACITY: usize = 16;

/// Session-independent monitor settings.
///
/// The airport, filter and interval are chosen per session in
/// [`MonitorService::start`](super::MonitorService::start); everything
/// else comes from here.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Monitoring radius around the airport.
    pub radius_nm: f64,
    /// Ceiling and miss threshold.
    pub tracker: TrackerConfig,
    /// Retry delays after failed polls.
    pub backoff: BackoffConfig,
    /// Push-message channel capacity. Slow subscribers lose the oldest messages.
    pub message_capacity: usize,
    /// Command channel capacity.
    pub command_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            radius_nm: DEFAULT_RADIUS_NM,
            tracker: TrackerConfig::default(),
            backoff: BackoffConfig::default(),
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }
}

impl MonitorConfig {
    /// Derives the monitor settings from the configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            radius_nm: config.monitor.radius_nm,
            tracker: TrackerConfig::default()
                .with_ceiling_ft(config.monitor.ceiling_ft)
                .with_miss_threshold(config.monitor.miss_threshold),
            backoff: BackoffConfig::new(
                Duration::from_secs(config.backoff.initial_secs),
                Duration::from_secs(config.backoff.max_secs),
            ),
            ..Self::default()
        }
    }

    /// Sets the monitoring radius.
    pub fn with_radius_nm(mut self, radius_nm: f64) -> Self {
        self.radius_nm = radius_nm;
        self
    }

    /// Sets the tracker tuning.
    pub fn with_tracker(mut self, tracker: TrackerConfig) -> Self {
        self.tracker = tracker;
        self
    }

    /// Sets the backoff delays.
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Checks the settings that have no type-level guarantee.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.radius_nm.is_finite() && self.radius_nm > 0.0) {
            return Err(ConfigError::InvalidSetting {
                key: "monitor.radius_nm".to_string(),
                reason: format!("{} is not a positive radius", self.radius_nm),
            });
        }
        if let Some(ceiling) = self.tracker.ceiling_ft {
            if !ceiling.is_finite() || ceiling < 0.0 {
                return Err(ConfigError::InvalidSetting {
                    key: "monitor.ceiling_ft".to_string(),
                    reason: format!("{} is not a valid altitude", ceiling),
                });
            }
        }
        Ok(())
    }
}

/// Validates a poll interval.
pub fn validate_interval(interval: Duration) -> Result<Duration, ConfigError> {
    let secs = interval.as_secs();
    let whole = interval.subsec_nanos() == 0;
    if !whole || !(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&secs) {
        return Err(ConfigError::InvalidInterval {
            secs,
            min: MIN_INTERVAL_SECS,
            max: MAX_INTERVAL_SECS,
        });
    }
    Ok(interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_bounds() {
        assert!(validate_interval(Duration::from_secs(5)).is_ok());
        assert!(validate_interval(Duration::from_secs(120)).is_ok());
        assert!(matches!(
            validate_interval(Duration::from_secs(4)),
            Err(ConfigError::InvalidInterval { secs: 4, .. })
        ));
        assert!(validate_interval(Duration::from_secs(121)).is_err());
        assert!(validate_interval(Duration::from_millis(5500)).is_err());
    }

    #[test]
    fn test_from_config_file() {
        let mut file = ConfigFile::default();
        file.monitor.radius_nm = 8.0;
        file.monitor.ceiling_ft = None;
        file.monitor.miss_threshold = 5;
        file.backoff.initial_secs = 20;
        file.backoff.max_secs = 600;

        let config = MonitorConfig::from_config_file(&file);
        assert_eq!(config.radius_nm, 8.0);
        assert_eq!(config.tracker.ceiling_ft, None);
        assert_eq!(config.tracker.miss_threshold, 5);
        assert_eq!(config.backoff.initial, Duration::from_secs(20));
        assert_eq!(config.backoff.max, Duration::from_secs(600));
    }

    #[test]
    fn test_validate() {
        assert!(MonitorConfig::default().validate().is_ok());
        assert!(MonitorConfig::default()
            .with_radius_nm(0.0)
            .validate()
            .is_err());
        let tracker = TrackerConfig::default().with_ceiling_ft(Some(f64::NAN));
        assert!(MonitorConfig::default()
            .with_tracker(tracker)
            .validate()
            .is_err());
    }
}
