//! Aircraft filter resolution
//!
//! A user-facing [`FilterSpec`] is resolved once, when it is set, into a
//! [`MatchSet`] that the tracker applies to every state vector of every poll.
//!
//! # Identifier mode
//!
//! Raw identifiers are classified in order:
//!
//! 1. Six hex digits: an ICAO24 address.
//! 2. A registration known to the aircraft registry: its ICAO24 address.
//! 3. Anything else: a callsign candidate, matched locally by prefix.
//!
//! Only ICAO24 addresses can be pushed to the API as an upstream filter, and
//! only when no callsign candidates exist. An upstream filter would otherwise
//! hide the aircraft the callsigns are meant to find.
//!
//! # Group mode
//!
//! Values are group names (expanded to their member type codes) or literal
//! type codes. Aircraft are matched on the type code the registry reports
//! for their ICAO24 address.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use thiserror::Error;

use crate::reference::{AircraftRegistry, PoiDatabase, TypeGroupLookup};
use crate::source::StateVector;

/// Errors raised while building or resolving a filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Group-mode values that are neither a group nor a known type code.
    #[error("unknown type groups or codes: {}", .0.join(", "))]
    UnknownTypeReferences(Vec<String>),

    /// A filtering mode was chosen but no values were given.
    #[error("filter has no values")]
    EmptyFilter,

    /// Selected planes of interest that are not in the list.
    #[error("unknown planes of interest: {}", .0.join(", "))]
    UnknownPlanes(Vec<String>),

    /// Unrecognised filter mode name.
    #[error("unknown filter mode '{0}' (expected all, aircraft or group)")]
    UnknownMode(String),
}

/// What the user asked to watch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilterSpec {
    /// Every aircraft in range.
    #[default]
    None,
    /// ICAO24 addresses, registrations or callsigns.
    ByIdentifier(Vec<String>),
    /// Type-group names or ICAO type codes.
    ByTypeGroup(Vec<String>),
}

impl FilterSpec {
    /// Builds a filter from a mode name and a comma-separated value list.
    ///
    /// Modes: `all`/`none`, `aircraft`/`identifier`, `group`/`type`.
    /// The value list is ignored for `all`.
    pub fn from_mode_str(mode: &str, values: &str) -> Result<Self, FilterError> {
        let values: Vec<String> = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();

        match mode.trim().to_lowercase().as_str() {
            "all" | "none" | "" => Ok(Self::None),
            "aircraft" | "identifier" => Ok(Self::ByIdentifier(values)),
            "group" | "type" => Ok(Self::ByTypeGroup(values)),
            other => Err(FilterError::UnknownMode(other.to_string())),
        }
    }

    /// Builds an identifier filter from the planes-of-interest list.
    ///
    /// An empty `selection` watches every plane on the list; otherwise only
    /// the planes named by ICAO24 address, tail number or name.
    pub fn from_planes(planes: &PoiDatabase, selection: &[String]) -> Result<Self, FilterError> {
        planes
            .identifiers(selection)
            .map(Self::ByIdentifier)
            .map_err(FilterError::UnknownPlanes)
    }

    /// Short mode name.
    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::None => "all",
            Self::ByIdentifier(_) => "aircraft",
            Self::ByTypeGroup(_) => "group",
        }
    }

    /// Raw values (empty for [`FilterSpec::None`]).
    pub fn values(&self) -> &[String] {
        match self {
            Self::None => &[],
            Self::ByIdentifier(v) | Self::ByTypeGroup(v) => v,
        }
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "all aircraft"),
            _ => write!(f, "{}: {}", self.mode_name(), self.values().join(", ")),
        }
    }
}

/// A resolved filter, cheap to apply per state vector.
#[derive(Clone, Default)]
pub enum MatchSet {
    /// Accept everything.
    #[default]
    All,
    /// Accept known ICAO24 addresses and callsigns starting with a candidate.
    Identifiers {
        hex: BTreeSet<String>,
        callsigns: BTreeSet<String>,
    },
    /// Accept aircraft whose registered type code is in the set.
    TypeCodes {
        codes: BTreeSet<String>,
        registry: Arc<dyn AircraftRegistry>,
    },
}

impl fmt::Debug for MatchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Identifiers { hex, callsigns } => f
                .debug_struct("Identifiers")
                .field("hex", hex)
                .field("callsigns", callsigns)
                .finish(),
            Self::TypeCodes { codes, .. } => f
                .debug_struct("TypeCodes")
                .field("codes", codes)
                .finish_non_exhaustive(),
        }
    }
}

impl MatchSet {
    /// Whether `state` passes the filter.
    pub fn matches(&self, state: &StateVector) -> bool {
        match self {
            Self::All => true,
            Self::Identifiers { hex, callsigns } => {
                if hex.contains(&state.icao24) {
                    return true;
                }
                match &state.callsign {
                    Some(callsign) => {
                        let callsign = callsign.to_uppercase();
                        callsigns.iter().any(|c| callsign.starts_with(c.as_str()))
                    }
                    None => false,
                }
            }
            Self::TypeCodes { codes, registry } => registry
                .icao24_to_type(&state.icao24)
                .map(|t| codes.contains(&t.to_uppercase()))
                .unwrap_or(false),
        }
    }

    /// ICAO24 addresses to send upstream, if the filter allows it.
    ///
    /// `Some` only for identifier sets that resolved entirely to addresses.
    pub fn upstream_icao24_filter(&self) -> Option<Vec<String>> {
        match self {
            Self::Identifiers { hex, callsigns } if callsigns.is_empty() && !hex.is_empty() => {
                Some(hex.iter().cloned().collect())
            }
            _ => None,
        }
    }

    /// Whether this set accepts everything.
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Resolves a filter against the reference lookups.
pub fn resolve(
    spec: &FilterSpec,
    groups: &dyn TypeGroupLookup,
    registry: Arc<dyn AircraftRegistry>,
) -> Result<MatchSet, FilterError> {
    match spec {
        FilterSpec::None => Ok(MatchSet::All),
        FilterSpec::ByIdentifier(values) => resolve_identifiers(values, registry.as_ref()),
        FilterSpec::ByTypeGroup(values) => resolve_type_groups(values, groups, registry),
    }
}

fn resolve_identifiers(
    values: &[String],
    registry: &dyn AircraftRegistry,
) -> Result<MatchSet, FilterError> {
    let mut hex = BTreeSet::new();
    let mut callsigns = BTreeSet::new();

    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        if is_icao24(value) {
            hex.insert(value.to_lowercase());
        } else if let Some(icao24) = registry.tail_to_icao24(value) {
            hex.insert(icao24.to_lowercase());
        } else {
            let callsign = value.to_uppercase();
            // Registrations like EI-ABC fly under the callsign EIABC.
            if callsign.contains('-') {
                callsigns.insert(callsign.replace('-', ""));
            }
            callsigns.insert(callsign);
        }
    }

    if hex.is_empty() && callsigns.is_empty() {
        return Err(FilterError::EmptyFilter);
    }

    tracing::debug!(
        hex = hex.len(),
        callsigns = callsigns.len(),
        "Resolved identifier filter"
    );
    Ok(MatchSet::Identifiers { hex, callsigns })
}

fn resolve_type_groups(
    values: &[String],
    groups: &dyn TypeGroupLookup,
    registry: Arc<dyn AircraftRegistry>,
) -> Result<MatchSet, FilterError> {
    let mut codes = BTreeSet::new();
    let mut unknown = Vec::new();

    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        if let Some(members) = groups.expand_group(value) {
            codes.extend(members.into_iter().map(|c| c.to_uppercase()));
        } else if groups.is_known_type(value) {
            codes.insert(value.to_uppercase());
        } else {
            unknown.push(value.to_string());
        }
    }

    if !unknown.is_empty() {
        return Err(FilterError::UnknownTypeReferences(unknown));
    }
    if codes.is_empty() {
        return Err(FilterError::EmptyFilter);
    }

    tracing::debug!(codes = codes.len(), "Resolved type-group filter");
    Ok(MatchSet::TypeCodes { codes, registry })
}

/// Whether `value` is a 24-bit ICAO address written as six hex digits.
pub fn is_icao24(value: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[0-9a-fA-F]{6}$").expect("valid ICAO24 pattern"))
        .is_match(value)
}
