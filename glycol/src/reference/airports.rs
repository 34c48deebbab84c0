//! Airport reference points.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Serialize;

use super::{AirportLookup, ReferenceError};
use crate::config::ConfigError;
use crate::coord::{bounding_box, is_valid_position, BoundingBox};

/// A validated airport reference point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportRef {
    /// ICAO airport code, uppercase (e.g. "KSFO").
    pub code: String,
    /// Human-readable name, or the code when unknown.
    pub name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl AirportRef {
    /// Creates a reference point, validating the code and coordinates.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Result<Self, ConfigError> {
        let code = code.into().trim().to_uppercase();
        if code.is_empty() {
            return Err(ConfigError::UnknownAirport(code));
        }
        if !is_valid_position(latitude, longitude) {
            return Err(ConfigError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }

        let name = name.into();
        let name = if name.trim().is_empty() {
            code.clone()
        } else {
            name
        };

        Ok(Self {
            code,
            name,
            latitude,
            longitude,
        })
    }

    /// The monitoring box around this airport.
    pub fn bounding_box(&self, radius_nm: f64) -> BoundingBox {
        bounding_box(self.latitude, self.longitude, radius_nm)
    }
}

/// In-memory airport table.
///
/// The on-disk format is a JSON object keyed by ICAO code whose values are
/// `[latitude, longitude, name]` arrays:
///
/// ```json
/// { "KSFO": [37.6188, -122.375, "San Francisco International Airport"] }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AirportDatabase {
    airports: HashMap<String, AirportRef>,
}

impl AirportDatabase {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads airports from a JSON file.
    ///
    /// Entries with out-of-range coordinates are skipped with a warning.
    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        let file = File::open(path).map_err(|source| ReferenceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: HashMap<String, (f64, f64, String)> =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                ReferenceError::Parse {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        let mut db = Self::new();
        for (code, (lat, lon, name)) in raw {
            match AirportRef::new(&code, name, lat, lon) {
                Ok(airport) => db.insert(airport),
                Err(e) => tracing::warn!(code = %code, error = %e, "Skipping airport entry"),
            }
        }

        tracing::info!(count = db.len(), path = %path.display(), "Loaded airport database");
        Ok(db)
    }

    /// Adds or replaces an airport.
    pub fn insert(&mut self, airport: AirportRef) {
        self.airports.insert(airport.code.clone(), airport);
    }

    /// Number of airports.
    pub fn len(&self) -> usize {
        self.airports.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    /// Sorted list of known codes.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.airports.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Human-readable name of an airport, or the code itself when unknown.
    pub fn airport_name(&self, code: &str) -> String {
        let code = code.trim().to_uppercase();
        self.airports
            .get(&code)
            .map(|a| a.name.clone())
            .unwrap_or(code)
    }
}

impl AirportLookup for AirportDatabase {
    fn lookup(&self, code: &str) -> Option<AirportRef> {
        self.airports.get(&code.trim().to_uppercase()).cloned()
    }
}

impl FromIterator<AirportRef> for AirportDatabase {
    fn from_iter<I: IntoIterator<Item = AirportRef>>(iter: I) -> Self {
        let mut db = Self::new();
        for airport in iter {
            db.insert(airport);
        }
        db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_airport_ref_normalizes_code() {
        let airport = AirportRef::new(" ksfo ", "", 37.6188, -122.375).unwrap();
        assert_eq!(airport.code, "KSFO");
        assert_eq!(airport.name, "KSFO");
    }

    #[test]
    fn test_airport_ref_rejects_bad_coordinates() {
        let result = AirportRef::new("XXXX", "Nowhere", 95.0, 0.0);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let db: AirportDatabase = [AirportRef::new("KSFO", "San Francisco", 37.6188, -122.375).unwrap()]
            .into_iter()
            .collect();

        assert!(db.lookup("ksfo").is_some());
        assert!(db.lookup("KJFK").is_none());
        assert_eq!(db.airport_name("ksfo"), "San Francisco");
        assert_eq!(db.airport_name("kjfk"), "KJFK");
    }

    #[test]
    fn test_load_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"KSFO": [37.6188, -122.375, "San Francisco"], "BAD": [120.0, 0.0, "Broken"]}}"#
        )
        .unwrap();

        let db = AirportDatabase::load(file.path()).unwrap();
        assert_eq!(db.len(), 1);
        assert_eq!(db.codes(), vec!["KSFO".to_string()]);
    }

    #[test]
    fn test_load_missing_file() {
        let result = AirportDatabase::load(Path::new("/nonexistent/airports.json"));
        assert!(matches!(result, Err(ReferenceError::Read { .. })));
    }
}
