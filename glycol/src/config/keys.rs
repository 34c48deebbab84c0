//! Typed configuration keys.
//!
//! Each [`ConfigKey`] names one `section.key` entry in `config.ini` and knows
//! how to read its value from, and parse a value into, a [`ConfigFile`].

use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, ConfigFile};

/// A configuration setting addressable as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    MonitorAirport,
    MonitorRadiusNm,
    MonitorIntervalSecs,
    MonitorCeilingFt,
    MonitorMissThreshold,
    BackoffInitialSecs,
    BackoffMaxSecs,
    OpenSkyBaseUrl,
    OpenSkyToken,
    OpenSkyTimeoutSecs,
    DataAirports,
    DataAircraftDb,
    DataTypeGroups,
    DataPlanesOfInterest,
    LoggingDirectory,
}

const ALL_KEYS: [ConfigKey; 15] = [
    ConfigKey::MonitorAirport,
    ConfigKey::MonitorRadiusNm,
    ConfigKey::MonitorIntervalSecs,
    ConfigKey::MonitorCeilingFt,
    ConfigKey::MonitorMissThreshold,
    ConfigKey::BackoffInitialSecs,
    ConfigKey::BackoffMaxSecs,
    ConfigKey::OpenSkyBaseUrl,
    ConfigKey::OpenSkyToken,
    ConfigKey::OpenSkyTimeoutSecs,
    ConfigKey::DataAirports,
    ConfigKey::DataAircraftDb,
    ConfigKey::DataTypeGroups,
    ConfigKey::DataPlanesOfInterest,
    ConfigKey::LoggingDirectory,
];

impl ConfigKey {
    /// All keys, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    /// INI section this key lives in.
    pub fn section(&self) -> &'static str {
        match self {
            Self::MonitorAirport
            | Self::MonitorRadiusNm
            | Self::MonitorIntervalSecs
            | Self::MonitorCeilingFt
            | Self::MonitorMissThreshold => "monitor",
            Self::BackoffInitialSecs | Self::BackoffMaxSecs => "backoff",
            Self::OpenSkyBaseUrl | Self::OpenSkyToken | Self::OpenSkyTimeoutSecs => "opensky",
            Self::DataAirports
            | Self::DataAircraftDb
            | Self::DataTypeGroups
            | Self::DataPlanesOfInterest => "data",
            Self::LoggingDirectory => "logging",
        }
    }

    /// Key name within the section.
    pub fn key_name(&self) -> &'static str {
        match self {
            Self::MonitorAirport => "airport",
            Self::MonitorRadiusNm => "radius_nm",
            Self::MonitorIntervalSecs => "interval_secs",
            Self::MonitorCeilingFt => "ceiling_ft",
            Self::MonitorMissThreshold => "miss_threshold",
            Self::BackoffInitialSecs => "initial_secs",
            Self::BackoffMaxSecs => "max_secs",
            Self::OpenSkyBaseUrl => "base_url",
            Self::OpenSkyToken => "token",
            Self::OpenSkyTimeoutSecs => "timeout_secs",
            Self::DataAirports => "airports",
            Self::DataAircraftDb => "aircraft_db",
            Self::DataTypeGroups => "type_groups",
            Self::DataPlanesOfInterest => "planes_of_interest",
            Self::LoggingDirectory => "directory",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as a string. Unset optional values are empty.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            Self::MonitorAirport => config.monitor.airport.clone().unwrap_or_default(),
            Self::MonitorRadiusNm => config.monitor.radius_nm.to_string(),
            Self::MonitorIntervalSecs => config.monitor.interval_secs.to_string(),
            Self::MonitorCeilingFt => match config.monitor.ceiling_ft {
                Some(ft) => ft.to_string(),
                None => "none".to_string(),
            },
            Self::MonitorMissThreshold => config.monitor.miss_threshold.to_string(),
            Self::BackoffInitialSecs => config.backoff.initial_secs.to_string(),
            Self::BackoffMaxSecs => config.backoff.max_secs.to_string(),
            Self::OpenSkyBaseUrl => config.opensky.base_url.clone(),
            Self::OpenSkyToken => config.opensky.token.clone().unwrap_or_default(),
            Self::OpenSkyTimeoutSecs => config.opensky.timeout_secs.to_string(),
            Self::DataAirports => config.data.airports.display().to_string(),
            Self::DataAircraftDb => config.data.aircraft_db.display().to_string(),
            Self::DataTypeGroups => config.data.type_groups.display().to_string(),
            Self::DataPlanesOfInterest => config.data.planes_of_interest.display().to_string(),
            Self::LoggingDirectory => config.logging.directory.display().to_string(),
        }
    }

    /// Parses `value` and stores it in `config`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            Self::MonitorAirport => {
                config.monitor.airport = non_empty(value).map(str::to_uppercase);
            }
            Self::MonitorRadiusNm => {
                let radius: f64 = self.parse(value)?;
                if !(radius.is_finite() && radius > 0.0) {
                    return Err(self.invalid("must be a positive number of nautical miles"));
                }
                config.monitor.radius_nm = radius;
            }
            Self::MonitorIntervalSecs => config.monitor.interval_secs = self.parse(value)?,
            Self::MonitorCeilingFt => {
                config.monitor.ceiling_ft = if value.is_empty() || value.eq_ignore_ascii_case("none")
                {
                    None
                } else {
                    Some(self.parse(value)?)
                };
            }
            Self::MonitorMissThreshold => {
                let threshold: u32 = self.parse(value)?;
                if threshold == 0 {
                    return Err(self.invalid("must be at least 1"));
                }
                config.monitor.miss_threshold = threshold;
            }
            Self::BackoffInitialSecs => config.backoff.initial_secs = self.parse(value)?,
            Self::BackoffMaxSecs => config.backoff.max_secs = self.parse(value)?,
            Self::OpenSkyBaseUrl => {
                if value.is_empty() {
                    return Err(self.invalid("must not be empty"));
                }
                config.opensky.base_url = value.trim_end_matches('/').to_string();
            }
            Self::OpenSkyToken => config.opensky.token = non_empty(value).map(str::to_string),
            Self::OpenSkyTimeoutSecs => config.opensky.timeout_secs = self.parse(value)?,
            Self::DataAirports => config.data.airports = expand_path(value),
            Self::DataAircraftDb => config.data.aircraft_db = expand_path(value),
            Self::DataTypeGroups => config.data.type_groups = expand_path(value),
            Self::DataPlanesOfInterest => config.data.planes_of_interest = expand_path(value),
            Self::LoggingDirectory => config.logging.directory = expand_path(value),
        }
        Ok(())
    }

    fn parse<T: FromStr>(&self, value: &str) -> Result<T, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        value.parse().map_err(|e: T::Err| self.invalid(&e.to_string()))
    }

    fn invalid(&self, reason: &str) -> ConfigError {
        ConfigError::InvalidSetting {
            key: self.name(),
            reason: reason.to_string(),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Expands a leading `~/` to the home directory.
fn expand_path(value: &str) -> PathBuf {
    if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_names() {
        assert_eq!(
            "monitor.interval_secs".parse::<ConfigKey>().unwrap(),
            ConfigKey::MonitorIntervalSecs
        );
        assert_eq!(
            "OpenSky.Token".parse::<ConfigKey>().unwrap(),
            ConfigKey::OpenSkyToken
        );
        assert!(matches!(
            "monitor.nope".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_every_key_roundtrips_its_default() {
        let config = ConfigFile::default();
        for key in ConfigKey::all() {
            let mut copy = config.clone();
            key.set(&mut copy, &key.get(&config)).unwrap();
            assert_eq!(copy, config, "key {} did not roundtrip", key.name());
        }
    }

    #[test]
    fn test_set_validates_values() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::MonitorMissThreshold.set(&mut config, "0").is_err());
        assert!(ConfigKey::MonitorRadiusNm.set(&mut config, "-1").is_err());
        assert!(ConfigKey::MonitorIntervalSecs.set(&mut config, "abc").is_err());

        ConfigKey::MonitorCeilingFt.set(&mut config, "2500").unwrap();
        assert_eq!(config.monitor.ceiling_ft, Some(2500.0));
        ConfigKey::MonitorCeilingFt.set(&mut config, "none").unwrap();
        assert_eq!(config.monitor.ceiling_ft, None);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let mut config = ConfigFile::default();
        ConfigKey::OpenSkyBaseUrl
            .set(&mut config, "http://localhost:8080/api/")
            .unwrap();
        assert_eq!(config.opensky.base_url, "http://localhost:8080/api");
    }
}
