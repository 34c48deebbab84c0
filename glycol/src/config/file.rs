//! INI configuration file.
//!
//! ```ini
//! [monitor]
//! airport = KSFO
//! radius_nm = 5
//! interval_secs = 10
//! ceiling_ft = 1500
//! miss_threshold = 3
//!
//! [backoff]
//! initial_secs = 10
//! max_secs = 300
//!
//! [opensky]
//! base_url = https://opensky-network.org/api
//! token =
//! timeout_secs = 15
//!
//! [data]
//! airports = ~/.glycol/data/us_airports.json
//! aircraft_db = ~/.glycol/data/basic-ac-db.json.gz
//! type_groups = ~/.glycol/data/type_groups.json
//! planes_of_interest = ~/.glycol/data/planes_of_interest.json
//!
//! [logging]
//! directory = ~/.glycol/logs
//! ```
//!
//! Missing keys fall back to defaults; unparseable values are errors.

use std::path::{Path, PathBuf};

use ini::Ini;

use super::{config_directory, config_file_path, ConfigError};

/// Default poll interval in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 10;

/// Default altitude ceiling in feet.
pub const DEFAULT_CEILING_FT: f64 = 1500.0;

/// Default number of consecutive missed polls before an aircraft is dropped.
pub const DEFAULT_MISS_THRESHOLD: u32 = 3;

/// Default initial backoff after a failed or rate-limited poll.
pub const DEFAULT_BACKOFF_INITIAL_SECS: u64 = 10;

/// Default backoff ceiling.
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Default OpenSky REST endpoint.
pub const DEFAULT_OPENSKY_URL: &str = "https://opensky-network.org/api";

/// Default HTTP timeout for OpenSky requests.
pub const DEFAULT_OPENSKY_TIMEOUT_SECS: u64 = 15;

/// `[monitor]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    /// Airport monitored when none is given on the command line.
    pub airport: Option<String>,
    pub radius_nm: f64,
    pub interval_secs: u64,
    /// `None` disables the ceiling.
    pub ceiling_ft: Option<f64>,
    pub miss_threshold: u32,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            airport: None,
            radius_nm: crate::coord::DEFAULT_RADIUS_NM,
            interval_secs: DEFAULT_INTERVAL_SECS,
            ceiling_ft: Some(DEFAULT_CEILING_FT),
            miss_threshold: DEFAULT_MISS_THRESHOLD,
        }
    }
}

/// `[backoff]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffSettings {
    pub initial_secs: u64,
    pub max_secs: u64,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            initial_secs: DEFAULT_BACKOFF_INITIAL_SECS,
            max_secs: DEFAULT_BACKOFF_MAX_SECS,
        }
    }
}

/// `[opensky]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenSkySettings {
    pub base_url: String,
    /// Pre-issued bearer token. Anonymous access when unset.
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for OpenSkySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENSKY_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_OPENSKY_TIMEOUT_SECS,
        }
    }
}

/// `[data]` section: reference database locations.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub airports: PathBuf,
    pub aircraft_db: PathBuf,
    pub type_groups: PathBuf,
    pub planes_of_interest: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        let data_dir = config_directory().join("data");
        Self {
            airports: data_dir.join("us_airports.json"),
            aircraft_db: data_dir.join("basic-ac-db.json.gz"),
            type_groups: data_dir.join("type_groups.json"),
            planes_of_interest: data_dir.join("planes_of_interest.json"),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: config_directory().join("logs"),
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub monitor: MonitorSettings,
    pub backoff: BackoffSettings,
    pub opensky: OpenSkySettings,
    pub data: DataSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Loads the configuration from the default location.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Loads the configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config = Self::default();
        for key in super::ConfigKey::all() {
            if let Some(value) = ini
                .section(Some(key.section()))
                .and_then(|props| props.get(key.key_name()))
            {
                key.set(&mut config, value)?;
            }
        }

        Ok(config)
    }

    /// Saves the configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Saves the configuration to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut ini = Ini::new();
        for key in super::ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }

        ini.write_to_file(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
