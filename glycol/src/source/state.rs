//! State vectors as reported by the tracking API.

use serde::{Deserialize, Serialize};

/// Feet per metre.
pub const FEET_PER_METER: f64 = 3.280_84;

/// Knots per metre/second.
pub const KNOTS_PER_MPS: f64 = 1.943_84;

/// One aircraft's instantaneous state in a single poll.
///
/// Altitudes are barometric and in metres, velocities in metres per second,
/// as delivered by OpenSky. Everything except the address and the ground
/// flag may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    /// ICAO24 transponder address, lowercase hex.
    pub icao24: String,
    /// Callsign, trimmed. `None` when blank.
    pub callsign: Option<String>,
    pub origin_country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Barometric altitude in metres.
    pub baro_altitude: Option<f64>,
    /// Ground-contact flag from the source.
    pub on_ground: bool,
    /// Ground speed in m/s.
    pub velocity: Option<f64>,
    /// Track over ground in degrees clockwise from north.
    pub true_track: Option<f64>,
    /// Vertical rate in m/s.
    pub vertical_rate: Option<f64>,
    pub squawk: Option<String>,
    /// ADS-B emitter category (extended responses only).
    pub category: Option<u8>,
}

impl StateVector {
    /// Creates a state vector with only the mandatory fields set.
    pub fn new(icao24: &str, on_ground: bool) -> Self {
        Self {
            icao24: normalize_icao24(icao24),
            callsign: None,
            origin_country: None,
            latitude: None,
            longitude: None,
            baro_altitude: None,
            on_ground,
            velocity: None,
            true_track: None,
            vertical_rate: None,
            squawk: None,
            category: None,
        }
    }

    /// Sets the callsign (trimmed; blank clears it).
    pub fn with_callsign(mut self, callsign: &str) -> Self {
        self.callsign = normalize_callsign(Some(callsign));
        self
    }

    /// Sets the barometric altitude in metres.
    pub fn with_altitude_m(mut self, meters: f64) -> Self {
        self.baro_altitude = Some(meters);
        self
    }

    /// Sets the barometric altitude from feet.
    pub fn with_altitude_ft(mut self, feet: f64) -> Self {
        self.baro_altitude = Some(feet / FEET_PER_METER);
        self
    }

    /// Sets the position.
    pub fn with_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Sets the ground speed in m/s.
    pub fn with_velocity(mut self, mps: f64) -> Self {
        self.velocity = Some(mps);
        self
    }

    /// Barometric altitude in feet.
    pub fn altitude_ft(&self) -> Option<f64> {
        self.baro_altitude.map(|m| m * FEET_PER_METER)
    }
}

/// Lowercases and trims an ICAO24 address.
pub fn normalize_icao24(icao24: &str) -> String {
    icao24.trim().to_lowercase()
}

/// Trims a callsign, mapping blanks to `None`.
pub fn normalize_callsign(callsign: Option<&str>) -> Option<String> {
    callsign
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}
