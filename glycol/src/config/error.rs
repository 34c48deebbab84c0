//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by invalid configuration.
///
/// These are fatal to [`crate::monitor::MonitorService::start`]: monitoring
/// never begins with a partially valid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The airport code is empty or not in the airport database.
    #[error("unknown airport code '{0}'")]
    UnknownAirport(String),

    /// Coordinates outside the valid WGS84 range.
    #[error("invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// Poll interval outside the supported range.
    #[error("poll interval {secs}s is outside {min}..={max}s")]
    InvalidInterval { secs: u64, min: u64, max: u64 },

    /// A setting has an unusable value.
    #[error("invalid value for {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    /// A `section.key` name that does not exist.
    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Failed to read or write the configuration file.
    #[error("configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid INI.
    #[error("failed to parse configuration file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}
