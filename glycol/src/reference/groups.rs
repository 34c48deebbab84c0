//! Aircraft type groups and type-code glossary.
//!
//! Groups are named collections of ICAO type codes ("passenger", "cargo",
//! "helicopters", ...) used by the group filter mode. The glossary maps type
//! codes to make/model/notes for display. Both live in one JSON file:
//!
//! ```json
//! {
//!   "groups":   { "passenger": ["B738", "A320"] },
//!   "glossary": { "B738": { "make": "Boeing", "model": "737-800", "notes": "" } }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{write_json, ReferenceError, TypeGroupLookup};

/// One glossary entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AircraftType {
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub notes: String,
}

/// Type groups and glossary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeGroupsDatabase {
    #[serde(default)]
    groups: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    glossary: BTreeMap<String, AircraftType>,
}

impl TypeGroupsDatabase {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the database from a JSON file.
    ///
    /// A missing file yields an empty database so that a fresh install can
    /// create groups before any file exists.
    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No type groups database, starting empty");
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
        db.normalize();

        tracing::info!(
            groups = db.groups.len(),
            types = db.glossary.len(),
            "Loaded type groups database"
        );
        Ok(db)
    }

    /// Writes the database to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ReferenceError> {
        write_json(path, self)
    }

    fn normalize(&mut self) {
        for codes in self.groups.values_mut() {
            for code in codes.iter_mut() {
                *code = code.trim().to_uppercase();
            }
        }
        self.glossary = std::mem::take(&mut self.glossary)
            .into_iter()
            .map(|(code, entry)| (code.trim().to_uppercase(), entry))
            .collect();
    }

    fn group_key(&self, name: &str) -> Option<String> {
        let wanted = name.trim();
        self.groups
            .keys()
            .find(|k| k.eq_ignore_ascii_case(wanted))
            .cloned()
    }

    /// Member codes of a group, in insertion order.
    pub fn group(&self, name: &str) -> Option<&[String]> {
        let key = self.group_key(name)?;
        self.groups.get(&key).map(Vec::as_slice)
    }

    /// Creates an empty or pre-populated group.
    pub fn create_group(&mut self, name: &str, codes: &[String]) -> Result<(), ReferenceError> {
        if self.group_key(name).is_some() {
            return Err(ReferenceError::GroupExists(name.to_string()));
        }
        let mut members: Vec<String> = Vec::new();
        for code in codes {
            let code = code.trim().to_uppercase();
            if !code.is_empty() && !members.contains(&code) {
                members.push(code);
            }
        }
        self.groups.insert(name.trim().to_string(), members);
        Ok(())
    }

    /// Adds a type code to a group.
    pub fn add_to_group(&mut self, name: &str, code: &str) -> Result<(), ReferenceError> {
        let key = self
            .group_key(name)
            .ok_or_else(|| ReferenceError::GroupNotFound(name.to_string()))?;
        let code = code.trim().to_uppercase();
        let members = self.groups.entry(key.clone()).or_default();
        if members.contains(&code) {
            return Err(ReferenceError::AlreadyInGroup { group: key, code });
        }
        members.push(code);
        Ok(())
    }

    /// Removes a type code from a group.
    pub fn remove_from_group(&mut self, name: &str, code: &str) -> Result<(), ReferenceError> {
        let key = self
            .group_key(name)
            .ok_or_else(|| ReferenceError::GroupNotFound(name.to_string()))?;
        let code = code.trim().to_uppercase();
        let members = self.groups.entry(key.clone()).or_default();
        let before = members.len();
        members.retain(|c| c != &code);
        if members.len() == before {
            return Err(ReferenceError::NotInGroup { group: key, code });
        }
        Ok(())
    }

    /// Deletes a group.
    pub fn delete_group(&mut self, name: &str) -> Result<(), ReferenceError> {
        let key = self
            .group_key(name)
            .ok_or_else(|| ReferenceError::GroupNotFound(name.to_string()))?;
        self.groups.remove(&key);
        Ok(())
    }

    /// Looks up a glossary entry.
    pub fn aircraft_type(&self, code: &str) -> Option<&AircraftType> {
        self.glossary.get(&code.trim().to_uppercase())
    }

    /// Adds or replaces a glossary entry.
    pub fn set_aircraft_type(&mut self, code: &str, entry: AircraftType) {
        self.glossary.insert(code.trim().to_uppercase(), entry);
    }

    /// Glossary entries whose code, make, model or notes contain `query`.
    pub fn search_types(&self, query: &str) -> Vec<(&str, &AircraftType)> {
        let query = query.to_lowercase();
        self.glossary
            .iter()
            .filter(|(code, t)| {
                code.to_lowercase().contains(&query)
                    || t.make.to_lowercase().contains(&query)
                    || t.model.to_lowercase().contains(&query)
                    || t.notes.to_lowercase().contains(&query)
            })
            .map(|(code, t)| (code.as_str(), t))
            .collect()
    }
}

impl TypeGroupLookup for TypeGroupsDatabase {
    fn expand_group(&self, name: &str) -> Option<BTreeSet<String>> {
        self.group(name).map(|codes| codes.iter().cloned().collect())
    }

    fn is_known_type(&self, code: &str) -> bool {
        let code = code.trim().to_uppercase();
        self.glossary.contains_key(&code) || self.groups.values().any(|g| g.contains(&code))
    }

    fn group_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }
}
