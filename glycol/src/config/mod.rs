//! Configuration management
//!
//! Settings live in `~/.glycol/config.ini`. Command-line arguments override
//! the file, and the file overrides the built-in defaults.

mod error;
mod file;
mod keys;

pub use error::ConfigError;
pub use file::{
    BackoffSettings, ConfigFile, DataSettings, LoggingSettings, MonitorSettings, OpenSkySettings,
    DEFAULT_BACKOFF_INITIAL_SECS, DEFAULT_BACKOFF_MAX_SECS, DEFAULT_CEILING_FT,
    DEFAULT_INTERVAL_SECS, DEFAULT_MISS_THRESHOLD, DEFAULT_OPENSKY_TIMEOUT_SECS,
    DEFAULT_OPENSKY_URL,
};
pub use keys::ConfigKey;

use std::path::PathBuf;

/// Name of the per-user configuration directory.
const CONFIG_DIR_NAME: &str = ".glycol";

/// Name of the configuration file within the configuration directory.
const CONFIG_FILE_NAME: &str = "config.ini";

/// The per-user configuration directory (`~/.glycol`).
///
/// Falls back to `./.glycol` when the home directory cannot be determined.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}
