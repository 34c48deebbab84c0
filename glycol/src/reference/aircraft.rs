//! Aircraft registration database.
//!
//! Loads the ADS-B Exchange "basic aircraft database": newline-delimited JSON,
//! optionally gzip-compressed, one aircraft per line:
//!
//! ```text
//! {"icao":"A1B2C3","reg":"N12345","icaotype":"C172", ...}
//! ```
//!
//! Two maps are derived from it: registration → ICAO24 and ICAO24 → type code.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::Deserialize;

use super::{AircraftRegistry, ReferenceError};

#[derive(Debug, Deserialize)]
struct AircraftRow {
    icao: Option<String>,
    reg: Option<String>,
    icaotype: Option<String>,
}

/// Registration and type lookups keyed by ICAO24.
#[derive(Debug, Clone, Default)]
pub struct AircraftDatabase {
    reg_to_icao: HashMap<String, String>,
    icao_to_type: HashMap<String, String>,
}

impl AircraftDatabase {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the database from disk.
    ///
    /// Files ending in `.gz` are decompressed on the fly. Malformed lines are
    /// skipped and counted.
    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        let file = File::open(path).map_err(|source| ReferenceError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        let mut db = Self::new();
        let mut skipped = 0usize;

        for line in BufReader::new(reader).lines() {
            let line = line.map_err(|source| ReferenceError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AircraftRow>(&line) {
                Ok(row) => db.insert_row(row),
                Err(_) => skipped += 1,
            }
        }

        tracing::info!(
            registrations = db.reg_to_icao.len(),
            types = db.icao_to_type.len(),
            skipped,
            path = %path.display(),
            "Loaded aircraft database"
        );
        Ok(db)
    }

    /// Adds one aircraft record.
    pub fn insert(&mut self, icao24: &str, registration: Option<&str>, type_code: Option<&str>) {
        let icao = icao24.trim().to_lowercase();
        if icao.is_empty() {
            return;
        }
        if let Some(reg) = registration.map(str::trim).filter(|r| !r.is_empty()) {
            self.reg_to_icao.insert(reg.to_uppercase(), icao.clone());
        }
        if let Some(code) = type_code.map(str::trim).filter(|c| !c.is_empty()) {
            self.icao_to_type.insert(icao, code.to_uppercase());
        }
    }

    fn insert_row(&mut self, row: AircraftRow) {
        if let Some(icao) = row.icao {
            self.insert(&icao, row.reg.as_deref(), row.icaotype.as_deref());
        }
    }

    /// Number of known registrations.
    pub fn registration_count(&self) -> usize {
        self.reg_to_icao.len()
    }

    /// Number of aircraft with a known type code.
    pub fn type_count(&self) -> usize {
        self.icao_to_type.len()
    }
}

impl AircraftRegistry for AircraftDatabase {
    fn icao24_to_type(&self, icao24: &str) -> Option<String> {
        self.icao_to_type.get(&icao24.trim().to_lowercase()).cloned()
    }

    fn tail_to_icao24(&self, tail: &str) -> Option<String> {
        self.reg_to_icao.get(&tail.trim().to_uppercase()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const ROWS: &str = concat!(
        r#"{"icao":"A1B2C3","reg":"N12345","icaotype":"c172"}"#,
        "\n",
        r#"{"icao":"4CA123","reg":"EI-ABC","icaotype":"B738"}"#,
        "\n",
        "not json\n",
        "\n",
        r#"{"icao":"abcdef","reg":null,"icaotype":""}"#,
        "\n",
    );

    #[test]
    fn test_insert_and_lookup() {
        let mut db = AircraftDatabase::new();
        db.insert("A1B2C3", Some("n12345"), Some("c172"));

        assert_eq!(db.tail_to_icao24("N12345").as_deref(), Some("a1b2c3"));
        assert_eq!(db.icao24_to_type("A1B2C3").as_deref(), Some("C172"));
        assert!(db.tail_to_icao24("N99999").is_none());
    }

    #[test]
    fn test_load_plain_ndjson() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(ROWS.as_bytes()).unwrap();

        let db = AircraftDatabase::load(file.path()).unwrap();
        assert_eq!(db.registration_count(), 2);
        assert_eq!(db.type_count(), 2);
        assert_eq!(db.tail_to_icao24("EI-ABC").as_deref(), Some("4ca123"));
        assert!(db.icao24_to_type("abcdef").is_none());
    }

    #[test]
    fn test_load_gzip_ndjson() {
        let file = tempfile::Builder::new().suffix(".json.gz").tempfile().unwrap();
        let mut encoder = GzEncoder::new(file.reopen().unwrap(), Compression::default());
        encoder.write_all(ROWS.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let db = AircraftDatabase::load(file.path()).unwrap();
        assert_eq!(db.icao24_to_type("4ca123").as_deref(), Some("B738"));
    }
}
