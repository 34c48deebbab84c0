//! Planes of interest.
//!
//! A short, hand-kept list of specific aircraft the user cares about. The
//! whole list can be watched at once as an identifier filter: each plane
//! contributes its ICAO24 address when known, otherwise its tail number.
//!
//! Stored as a JSON array:
//!
//! ```json
//! [
//!   { "name": "Company jet", "tailnumber": "N12345", "icao24": "a1b2c3",
//!     "make_model": "Cessna Citation", "notes": "" }
//! ]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{write_json, ReferenceError};
use crate::source::normalize_icao24;

/// One tracked plane.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaneOfInterest {
    #[serde(default)]
    pub name: String,
    /// Registration, uppercase. Unique within the list.
    #[serde(default)]
    pub tailnumber: String,
    /// ICAO24 address, lowercase. Empty when unknown.
    #[serde(default)]
    pub icao24: String,
    #[serde(default)]
    pub make_model: String,
    #[serde(default)]
    pub notes: String,
}

impl PlaneOfInterest {
    /// Creates an entry with only a tail number.
    pub fn new(tailnumber: &str) -> Self {
        Self {
            tailnumber: tailnumber.trim().to_uppercase(),
            ..Self::default()
        }
    }

    pub fn with_icao24(mut self, icao24: &str) -> Self {
        self.icao24 = normalize_icao24(icao24);
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.trim().to_string();
        self
    }

    pub fn with_make_model(mut self, make_model: &str) -> Self {
        self.make_model = make_model.trim().to_string();
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = notes.trim().to_string();
        self
    }

    /// Identifier used when the plane joins a filter.
    ///
    /// The ICAO24 address is preferred because it can be filtered upstream.
    pub fn identifier(&self) -> Option<&str> {
        [self.icao24.as_str(), self.tailnumber.as_str()]
            .into_iter()
            .find(|id| !id.is_empty())
    }

    /// Name for display: the given name, else the tail number.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.tailnumber
        } else {
            &self.name
        }
    }

    fn normalize(&mut self) {
        self.tailnumber = self.tailnumber.trim().to_uppercase();
        self.icao24 = normalize_icao24(&self.icao24);
    }
}

/// Field changes for [`PoiDatabase::update`]. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaneUpdate {
    pub name: Option<String>,
    pub icao24: Option<String>,
    pub make_model: Option<String>,
    pub notes: Option<String>,
}

impl PlaneUpdate {
    /// Whether any field would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.icao24.is_none()
            && self.make_model.is_none()
            && self.notes.is_none()
    }
}

/// The planes-of-interest list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoiDatabase {
    planes: Vec<PlaneOfInterest>,
}

impl PoiDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the list from a JSON file. A missing file yields an empty list.
    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No planes of interest database, starting empty");
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path).map_err(|source| ReferenceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut db: Self =
            serde_json::from_str(&content).map_err(|source| ReferenceError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        for plane in &mut db.planes {
            plane.normalize();
        }
        db.planes.retain(|p| !p.tailnumber.is_empty() || !p.icao24.is_empty());

        tracing::info!(planes = db.planes.len(), "Loaded planes of interest");
        Ok(db)
    }

    /// Writes the list to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ReferenceError> {
        write_json(path, self)
    }

    /// All planes, in insertion order.
    pub fn planes(&self) -> &[PlaneOfInterest] {
        &self.planes
    }

    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Adds a plane. Tail numbers must be unique.
    pub fn add(&mut self, mut plane: PlaneOfInterest) -> Result<(), ReferenceError> {
        plane.normalize();
        if plane.tailnumber.is_empty() {
            return Err(ReferenceError::MissingTailNumber);
        }
        if self.by_tailnumber(&plane.tailnumber).is_some() {
            return Err(ReferenceError::PlaneExists(plane.tailnumber));
        }
        self.planes.push(plane);
        Ok(())
    }

    /// Finds a plane by ICAO24 address first, then by tail number.
    pub fn get(&self, identifier: &str) -> Option<&PlaneOfInterest> {
        self.position(identifier).map(|i| &self.planes[i])
    }

    /// Changes the fields given in `update` on the plane matching `identifier`.
    pub fn update(&mut self, identifier: &str, update: PlaneUpdate) -> Result<(), ReferenceError> {
        let index = self
            .position(identifier)
            .ok_or_else(|| ReferenceError::PlaneNotFound(identifier.to_string()))?;
        let plane = &mut self.planes[index];
        if let Some(name) = update.name {
            plane.name = name.trim().to_string();
        }
        if let Some(icao24) = update.icao24 {
            plane.icao24 = normalize_icao24(&icao24);
        }
        if let Some(make_model) = update.make_model {
            plane.make_model = make_model.trim().to_string();
        }
        if let Some(notes) = update.notes {
            plane.notes = notes.trim().to_string();
        }
        Ok(())
    }

    /// Removes the plane matching `identifier` and returns it.
    pub fn remove(&mut self, identifier: &str) -> Result<PlaneOfInterest, ReferenceError> {
        let index = self
            .position(identifier)
            .ok_or_else(|| ReferenceError::PlaneNotFound(identifier.to_string()))?;
        Ok(self.planes.remove(index))
    }

    /// Filter identifiers for every plane, or for the selected ones.
    ///
    /// `selection` entries may be ICAO24 addresses, tail numbers or names.
    /// Returns the entries that matched nothing as the error value.
    pub fn identifiers(&self, selection: &[String]) -> Result<Vec<String>, Vec<String>> {
        if selection.is_empty() {
            return Ok(self
                .planes
                .iter()
                .filter_map(|p| p.identifier().map(str::to_string))
                .collect());
        }

        let mut identifiers = Vec::new();
        let mut unknown = Vec::new();
        for wanted in selection {
            let plane = self.get(wanted).or_else(|| {
                self.planes
                    .iter()
                    .find(|p| !p.name.is_empty() && p.name.eq_ignore_ascii_case(wanted.trim()))
            });
            match plane.and_then(PlaneOfInterest::identifier) {
                Some(id) => identifiers.push(id.to_string()),
                None => unknown.push(wanted.clone()),
            }
        }

        if unknown.is_empty() {
            Ok(identifiers)
        } else {
            Err(unknown)
        }
    }

    fn by_tailnumber(&self, tailnumber: &str) -> Option<usize> {
        let wanted = tailnumber.trim().to_uppercase();
        self.planes.iter().position(|p| p.tailnumber == wanted)
    }

    fn position(&self, identifier: &str) -> Option<usize> {
        let icao = normalize_icao24(identifier);
        if icao.is_empty() {
            return None;
        }
        self.planes
            .iter()
            .position(|p| p.icao24 == icao)
            .or_else(|| self.by_tailnumber(identifier))
    }
}
