//! Takeoff and landing events
//!
//! [`EventEmitter`] turns tracker [`GroundDelta`]s into [`Event`]s:
//!
//! | old ground | new ground | event   |
//! |------------|------------|---------|
//! | `true`     | `false`    | takeoff |
//! | `false`    | `true`     | landing |
//! | `None`     | any        | none    |
//! | same       | same       | none    |
//!
//! Events are collected in a session [`EventLog`].

mod log;

pub use log::EventLog;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::FEET_PER_METER;
use crate::tracker::GroundDelta;

/// Kind of ground-state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Takeoff,
    Landing,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Takeoff => write!(f, "takeoff"),
            EventType::Landing => write!(f, "landing"),
        }
    }
}

/// A detected takeoff or landing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub icao24: String,
    pub callsign: Option<String>,
    /// Barometric altitude in metres at the poll that saw the change.
    pub altitude: Option<f64>,
    /// Poll time.
    pub timestamp: DateTime<Utc>,
    /// Monitored airport code.
    pub airport: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Ground speed in m/s.
    pub velocity: Option<f64>,
}

impl Event {
    /// Altitude in feet.
    pub fn altitude_ft(&self) -> Option<f64> {
        self.altitude.map(|m| m * FEET_PER_METER)
    }

    /// Callsign, or the ICAO24 address when none was seen.
    pub fn display_name(&self) -> &str {
        self.callsign.as_deref().unwrap_or(&self.icao24)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:<7} {:<8} ({}) at {}",
            self.timestamp.format("%H:%M:%S"),
            self.event_type,
            self.display_name(),
            self.icao24,
            self.airport
        )?;
        if let Some(ft) = self.altitude_ft() {
            write!(f, ", {:.0} ft", ft)?;
        }
        Ok(())
    }
}

/// Builds events for one airport.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    airport: String,
}

impl EventEmitter {
    /// Creates an emitter stamping events with `airport`.
    pub fn new(airport: impl Into<String>) -> Self {
        Self {
            airport: airport.into(),
        }
    }

    /// Airport code stamped on events.
    pub fn airport(&self) -> &str {
        &self.airport
    }

    /// Converts deltas into events, preserving order.
    pub fn emit(&self, deltas: &[GroundDelta], timestamp: DateTime<Utc>) -> Vec<Event> {
        deltas
            .iter()
            .filter_map(|delta| {
                let event_type = match (delta.old_ground?, delta.new_ground) {
                    (true, false) => EventType::Takeoff,
                    (false, true) => EventType::Landing,
                    _ => return None,
                };
                let aircraft = &delta.aircraft;

                tracing::info!(
                    event = %event_type,
                    icao24 = %delta.icao24,
                    callsign = aircraft.last_seen_callsign.as_deref().unwrap_or("-"),
                    airport = %self.airport,
                    "Detected {}",
                    event_type
                );

                Some(Event {
                    event_type,
                    icao24: delta.icao24.clone(),
                    callsign: aircraft.last_seen_callsign.clone(),
                    altitude: aircraft.last_seen_altitude,
                    timestamp,
                    airport: self.airport.clone(),
                    latitude: aircraft.latitude,
                    longitude: aircraft.longitude,
                    velocity: aircraft.velocity,
                })
            })
            .collect()
    }
}
