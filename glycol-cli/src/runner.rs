//! Shared setup for commands that touch the monitor.

use std::path::Path;

use tracing::{info, warn};

use glycol::config::{config_file_path, ConfigFile};
use glycol::logging::{init_logging, LoggingGuard};
use glycol::reference::{
    AircraftDatabase, AirportDatabase, AirportLookup, AirportRef, PoiDatabase, TypeGroupsDatabase,
};

use crate::error::CliError;

/// Loads configuration, installs logging and opens reference data.
pub struct CliRunner {
    config: ConfigFile,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Loads `config.ini` and starts console and file logging.
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;
        let logging = init_logging(Some(&config.logging.directory), verbose)?;
        Ok(Self {
            config,
            _logging: logging,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Logs the command and where settings came from.
    pub fn log_startup(&self, command: &str) {
        info!(
            version = glycol::VERSION,
            command,
            config = %config_file_path().display(),
            logs = %self.config.logging.directory.display(),
            "Glycol starting"
        );
    }

    /// Loads the airport database.
    ///
    /// When `required` is false a missing or broken database is logged and
    /// replaced by an empty one, for callers that have explicit coordinates.
    pub fn load_airports(&self, required: bool) -> Result<AirportDatabase, CliError> {
        tolerate(
            AirportDatabase::load(&self.config.data.airports).map_err(CliError::from),
            required,
            "Airport database unavailable",
        )
    }

    /// Loads the aircraft registry, or an empty one if the file is missing.
    ///
    /// Without a registry, registrations resolve as callsigns and group
    /// filters match nothing.
    pub fn load_aircraft_db(&self) -> Result<AircraftDatabase, CliError> {
        load_optional(&self.config.data.aircraft_db, AircraftDatabase::load, "aircraft registry")
    }

    /// Loads the type groups.
    pub fn load_type_groups(&self) -> Result<TypeGroupsDatabase, CliError> {
        Ok(TypeGroupsDatabase::load(&self.config.data.type_groups)?)
    }

    /// Loads the planes-of-interest list.
    pub fn load_planes(&self) -> Result<PoiDatabase, CliError> {
        Ok(PoiDatabase::load(&self.config.data.planes_of_interest)?)
    }
}

/// Picks the monitored airport.
///
/// Explicit coordinates win over the airport database, so any location can
/// be watched even when `airports` is empty.
pub fn resolve_airport(
    airports: &dyn AirportLookup,
    code: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<AirportRef, CliError> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => {
            let name = airports.lookup(code).map(|a| a.name).unwrap_or_default();
            Ok(AirportRef::new(code, name, lat, lon)?)
        }
        (None, None) => resolve_from(airports, code),
        _ => Err(CliError::Config(
            "--lat and --lon must be given together".to_string(),
        )),
    }
}

/// Looks up `code`, mapping a miss to an unknown-airport error.
fn resolve_from(airports: &dyn AirportLookup, code: &str) -> Result<AirportRef, CliError> {
    airports.lookup(code).ok_or_else(|| {
        CliError::Config(format!(
            "Unknown airport '{}'. Check the code or pass --lat/--lon.",
            code.trim().to_uppercase()
        ))
    })
}

fn tolerate<T: Default>(
    result: Result<T, CliError>,
    required: bool,
    message: &str,
) -> Result<T, CliError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if !required => {
            warn!(error = %e, "{}", message);
            Ok(T::default())
        }
        Err(e) => Err(e),
    }
}

fn load_optional<T: Default>(
    path: &Path,
    load: impl FnOnce(&Path) -> Result<T, glycol::reference::ReferenceError>,
    what: &str,
) -> Result<T, CliError> {
    if !path.exists() {
        warn!(path = %path.display(), "No {} found, continuing without it", what);
        return Ok(T::default());
    }
    Ok(load(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_from_database() {
        let airports: AirportDatabase =
            vec![AirportRef::new("KSFO", "San Francisco", 37.6213, -122.379).unwrap()]
                .into_iter()
                .collect();

        let airport = resolve_from(&airports, "ksfo").unwrap();
        assert_eq!(airport.code, "KSFO");

        let err = resolve_from(&airports, "zzzz").unwrap_err();
        assert!(err.to_string().contains("ZZZZ"));
    }

    #[test]
    fn test_explicit_coordinates_skip_lookup() {
        let empty = AirportDatabase::default();
        let airport = resolve_airport(&empty, "x01", Some(40.0), Some(-105.0)).unwrap();
        assert_eq!(airport.code, "X01");
        assert_eq!(airport.latitude, 40.0);

        assert!(resolve_airport(&empty, "KSFO", None, None).is_err());
        assert!(matches!(
            resolve_airport(&empty, "KSFO", Some(37.6), None),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_explicit_coordinates_keep_database_name() {
        let airports: AirportDatabase =
            vec![AirportRef::new("KSFO", "San Francisco", 37.6213, -122.379).unwrap()]
                .into_iter()
                .collect();
        let airport = resolve_airport(&airports, "KSFO", Some(37.62), Some(-122.38)).unwrap();
        assert_eq!(airport.name, "San Francisco");
        assert_eq!(airport.longitude, -122.38);
    }

    #[test]
    fn test_tolerate_only_when_optional() {
        let broken = || -> Result<AirportDatabase, CliError> {
            Err(CliError::Config("bad airports file".to_string()))
        };
        assert!(tolerate(broken(), false, "ignored").unwrap().lookup("KSFO").is_none());
        assert!(tolerate(broken(), true, "fatal").is_err());
    }

    #[test]
    fn test_load_optional_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = load_optional(
            &dir.path().join("missing.json.gz"),
            AircraftDatabase::load,
            "aircraft registry",
        )
        .unwrap();
        assert_eq!(db.registration_count(), 0);
    }
}
