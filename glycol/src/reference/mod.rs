//! Static reference lookups
//!
//! The monitor needs three pieces of reference data that never change during
//! a session:
//!
//! - **Airports**: ICAO code → reference point ([`AirportDatabase`])
//! - **Aircraft registry**: registration ↔ ICAO24 and ICAO24 → type code
//!   ([`AircraftDatabase`])
//! - **Type groups**: named collections of type codes plus a glossary
//!   ([`TypeGroupsDatabase`])
//! - **Planes of interest**: a hand-kept list of specific aircraft that can
//!   be watched as one identifier filter ([`PoiDatabase`])
//!
//! Each is exposed through a small trait so the filter resolver and the
//! tracker can be tested against in-memory tables.

mod aircraft;
mod airports;
mod groups;
mod poi;

pub use aircraft::AircraftDatabase;
pub use airports::{AirportDatabase, AirportRef};
pub use groups::{AircraftType, TypeGroupsDatabase};
pub use poi::{PlaneOfInterest, PlaneUpdate, PoiDatabase};

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Errors raised while loading or editing reference data.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// Failed to read a reference file.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a reference file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A reference file contained malformed JSON.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// In-memory data could not be encoded as JSON.
    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A file parsed as JSON but its content is unusable.
    #[error("invalid data in {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    /// A group with this name already exists.
    #[error("group '{0}' already exists")]
    GroupExists(String),

    /// No group with this name exists.
    #[error("group '{0}' not found")]
    GroupNotFound(String),

    /// The type code is already a member of the group.
    #[error("type code {code} is already in group '{group}'")]
    AlreadyInGroup { group: String, code: String },

    /// The type code is not a member of the group.
    #[error("type code {code} is not in group '{group}'")]
    NotInGroup { group: String, code: String },

    /// A plane with this tail number is already listed.
    #[error("plane {0} is already a plane of interest")]
    PlaneExists(String),

    /// Planes of interest are keyed by tail number.
    #[error("a plane of interest needs a tail number")]
    MissingTailNumber,

    /// No plane matches the tail number or ICAO24 address.
    #[error("plane '{0}' not found")]
    PlaneNotFound(String),
}

/// Writes `value` as pretty JSON, creating parent directories.
///
/// Nothing is written if encoding fails.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), ReferenceError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| {
        ReferenceError::Serialize {
            path: path.to_path_buf(),
            source,
        }
    })?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ReferenceError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, json).map_err(|source| ReferenceError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Aircraft identity lookups backed by a registration database.
pub trait AircraftRegistry: Send + Sync {
    /// Resolves an ICAO24 address (lowercase hex) to its ICAO type code.
    fn icao24_to_type(&self, icao24: &str) -> Option<String>;

    /// Resolves a registration (tail number) to its ICAO24 address.
    fn tail_to_icao24(&self, tail: &str) -> Option<String>;
}

/// Type-group lookups used by the group filter mode.
pub trait TypeGroupLookup: Send + Sync {
    /// Expands a group name to its member type codes.
    ///
    /// Returns `None` when no group with that name exists.
    fn expand_group(&self, name: &str) -> Option<BTreeSet<String>>;

    /// Whether a literal type code is known to the glossary or any group.
    fn is_known_type(&self, code: &str) -> bool;

    /// All group names, sorted.
    fn group_names(&self) -> Vec<String>;
}

/// Airport code lookups.
pub trait AirportLookup: Send + Sync {
    /// Looks up an airport by ICAO code (case-insensitive).
    fn lookup(&self, code: &str) -> Option<AirportRef>;
}
