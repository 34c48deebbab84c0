//! Per-aircraft ground-state tracking across polls.
//!
//! The tracker remembers the last ground-contact flag of every aircraft it
//! has accepted and reports a [`GroundDelta`] whenever that flag changes
//! between two sightings.
//!
//! # Poll cycle
//!
//! ```text
//! snapshot ──► MatchSet ──► ceiling ──► first occurrence per icao24
//!                                              │
//!                     ┌────────────────────────┴──────────────┐
//!                     ▼                                        ▼
//!              known aircraft                           new aircraft
//!       flag changed? → GroundDelta                 baseline only, no delta
//!
//! tracked but not accepted this poll ──► miss_count + 1 ──► removed at threshold
//! ```
//!
//! Removal forgets the baseline. An aircraft that reappears after removal is
//! a first sighting again, so a long gap never produces a phantom landing
//! or takeoff.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{DEFAULT_CEILING_FT, DEFAULT_MISS_THRESHOLD};
use crate::filter::MatchSet;
use crate::source::{StateVector, FEET_PER_METER};

/// Tracker tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    /// Airborne aircraft above this altitude (feet) are ignored. `None`
    /// disables the ceiling.
    pub ceiling_ft: Option<f64>,
    /// Consecutive missed polls after which an entry is dropped.
    pub miss_threshold: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ceiling_ft: Some(DEFAULT_CEILING_FT),
            miss_threshold: DEFAULT_MISS_THRESHOLD,
        }
    }
}

impl TrackerConfig {
    /// Sets the altitude ceiling.
    pub fn with_ceiling_ft(mut self, ceiling_ft: Option<f64>) -> Self {
        self.ceiling_ft = ceiling_ft;
        self
    }

    /// Sets the miss threshold (clamped to at least 1).
    pub fn with_miss_threshold(mut self, threshold: u32) -> Self {
        self.miss_threshold = threshold.max(1);
        self
    }
}

/// What the tracker remembers about one aircraft.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedAircraft {
    pub icao24: String,
    pub last_seen_callsign: Option<String>,
    pub last_on_ground: bool,
    /// Barometric altitude in metres.
    pub last_seen_altitude: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Ground speed in m/s.
    pub velocity: Option<f64>,
    pub true_track: Option<f64>,
    pub first_seen: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    /// Consecutive polls without an accepted sighting.
    pub miss_count: u32,
}

impl TrackedAircraft {
    fn from_state(state: &StateVector, now: DateTime<Utc>) -> Self {
        let mut aircraft = Self {
            icao24: state.icao24.clone(),
            last_seen_callsign: None,
            last_on_ground: state.on_ground,
            last_seen_altitude: None,
            latitude: None,
            longitude: None,
            velocity: None,
            true_track: None,
            first_seen: now,
            last_update: now,
            miss_count: 0,
        };
        aircraft.apply(state, now);
        aircraft
    }

    fn apply(&mut self, state: &StateVector, now: DateTime<Utc>) {
        // A sighting without a callsign keeps the last known one.
        if state.callsign.is_some() {
            self.last_seen_callsign = state.callsign.clone();
        }
        self.last_on_ground = state.on_ground;
        self.last_seen_altitude = state.baro_altitude;
        self.latitude = state.latitude;
        self.longitude = state.longitude;
        self.velocity = state.velocity;
        self.true_track = state.true_track;
        self.last_update = now;
        self.miss_count = 0;
    }

    /// Last altitude in feet.
    pub fn altitude_ft(&self) -> Option<f64> {
        self.last_seen_altitude.map(|m| m * FEET_PER_METER)
    }
}

/// A change of ground-contact state.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundDelta {
    pub icao24: String,
    /// Previous flag; `None` for a first sighting.
    pub old_ground: Option<bool>,
    pub new_ground: bool,
    /// Entry after the update.
    pub aircraft: TrackedAircraft,
}

/// Result of one [`AircraftTracker::update`].
#[derive(Debug, Clone, Default)]
pub struct TrackerUpdate {
    /// Aircraft accepted this poll, sorted by ICAO24.
    pub current: Vec<TrackedAircraft>,
    /// Ground-state changes, in snapshot order.
    pub deltas: Vec<GroundDelta>,
    /// ICAO24 addresses dropped after too many missed polls.
    pub removed: Vec<String>,
}

/// Tracks aircraft ground state between polls.
#[derive(Debug, Default)]
pub struct AircraftTracker {
    config: TrackerConfig,
    aircraft: HashMap<String, TrackedAircraft>,
}

impl AircraftTracker {
    /// Creates an empty tracker.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            aircraft: HashMap::new(),
        }
    }

    /// Tracker settings.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Applies one snapshot.
    pub fn update(
        &mut self,
        snapshot: &[StateVector],
        filter: &MatchSet,
        now: DateTime<Utc>,
    ) -> TrackerUpdate {
        let mut seen: HashSet<String> = HashSet::new();
        let mut deltas = Vec::new();
        let mut current = Vec::new();

        for state in snapshot {
            if !filter.matches(state) || !self.below_ceiling(state) {
                continue;
            }
            if !seen.insert(state.icao24.clone()) {
                continue;
            }

            match self.aircraft.get_mut(&state.icao24) {
                Some(entry) => {
                    let old_ground = entry.last_on_ground;
                    entry.apply(state, now);
                    if old_ground != state.on_ground {
                        tracing::debug!(
                            icao24 = %state.icao24,
                            from = old_ground,
                            to = state.on_ground,
                            "Ground state changed"
                        );
                        deltas.push(GroundDelta {
                            icao24: state.icao24.clone(),
                            old_ground: Some(old_ground),
                            new_ground: state.on_ground,
                            aircraft: entry.clone(),
                        });
                    }
                    current.push(entry.clone());
                }
                None => {
                    let entry = TrackedAircraft::from_state(state, now);
                    tracing::debug!(icao24 = %state.icao24, on_ground = state.on_ground, "New aircraft");
                    current.push(entry.clone());
                    self.aircraft.insert(state.icao24.clone(), entry);
                }
            }
        }

        let removed = self.age_unseen(&seen);
        current.sort_by(|a, b| a.icao24.cmp(&b.icao24));

        TrackerUpdate {
            current,
            deltas,
            removed,
        }
    }

    /// Counts a poll in which nothing was observed (failed fetch).
    ///
    /// Returns the ICAO24 addresses that were dropped.
    pub fn record_missed_poll(&mut self) -> Vec<String> {
        self.age_unseen(&HashSet::new())
    }

    /// Forgets every aircraft.
    pub fn reset(&mut self) {
        self.aircraft.clear();
    }

    /// Number of tracked aircraft.
    pub fn len(&self) -> usize {
        self.aircraft.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.aircraft.is_empty()
    }

    /// Looks up a tracked aircraft.
    pub fn get(&self, icao24: &str) -> Option<&TrackedAircraft> {
        self.aircraft.get(icao24)
    }

    /// All tracked aircraft, sorted by ICAO24.
    pub fn tracked(&self) -> Vec<TrackedAircraft> {
        let mut all: Vec<_> = self.aircraft.values().cloned().collect();
        all.sort_by(|a, b| a.icao24.cmp(&b.icao24));
        all
    }

    fn below_ceiling(&self, state: &StateVector) -> bool {
        if state.on_ground {
            return true;
        }
        match (self.config.ceiling_ft, state.altitude_ft()) {
            (Some(ceiling), Some(altitude)) => altitude <= ceiling,
            _ => true,
        }
    }

    fn age_unseen(&mut self, seen: &HashSet<String>) -> Vec<String> {
        let threshold = self.config.miss_threshold.max(1);
        let mut removed = Vec::new();

        for (icao24, entry) in self.aircraft.iter_mut() {
            if seen.contains(icao24) {
                continue;
            }
            entry.miss_count += 1;
            if entry.miss_count >= threshold {
                removed.push(icao24.clone());
            }
        }

        for icao24 in &removed {
            self.aircraft.remove(icao24);
        }
        removed.sort();

        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "Dropped aircraft out of range");
        }
        removed
    }
}
