//! Monitoring session state.
//!
//! A [`MonitorSession`] owns everything that changes while an airport is
//! being watched: the tracker, the resolved filter and the event log. Only
//! the poll loop mutates it. Everyone else sees [`SessionSnapshot`]s.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::coord::BoundingBox;
use crate::events::{Event, EventEmitter, EventLog, EventType};
use crate::filter::{FilterSpec, MatchSet};
use crate::reference::AirportRef;
use crate::source::StateSnapshot;
use crate::tracker::{AircraftTracker, TrackedAircraft, TrackerConfig};

/// Poll counters for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    /// Successful polls.
    pub polls: u64,
    /// Polls that failed with a transient error.
    pub failed_polls: u64,
    /// Polls refused by the rate limiter.
    pub rate_limited_polls: u64,
    pub last_poll: Option<DateTime<Utc>>,
    /// Last transient error, cleared by the next successful poll.
    pub last_error: Option<String>,
    /// Remaining API quota as last reported.
    pub rate_limit_remaining: Option<u32>,
    /// Set while a rate-limit pause is in effect.
    pub rate_limited_until: Option<DateTime<Utc>>,
}

/// Result of applying one successful poll.
#[derive(Debug, Clone, Default)]
pub struct PollOutcome {
    /// Aircraft accepted in this poll.
    pub current: Vec<TrackedAircraft>,
    /// Events detected in this poll.
    pub new_events: Vec<Event>,
}

/// Mutable state of one monitoring session.
#[derive(Debug)]
pub struct MonitorSession {
    airport: AirportRef,
    bbox: BoundingBox,
    interval: Duration,
    filter_spec: FilterSpec,
    match_set: MatchSet,
    tracker: AircraftTracker,
    emitter: EventEmitter,
    log: EventLog,
    current: Vec<TrackedAircraft>,
    stats: SessionStats,
    started_at: DateTime<Utc>,
}

impl MonitorSession {
    /// Creates a session for `airport`.
    pub fn new(
        airport: AirportRef,
        radius_nm: f64,
        interval: Duration,
        filter_spec: FilterSpec,
        match_set: MatchSet,
        tracker: TrackerConfig,
    ) -> Self {
        let bbox = airport.bounding_box(radius_nm);
        let emitter = EventEmitter::new(airport.code.clone());
        Self {
            airport,
            bbox,
            interval,
            filter_spec,
            match_set,
            tracker: AircraftTracker::new(tracker),
            emitter,
            log: EventLog::new(),
            current: Vec::new(),
            stats: SessionStats::default(),
            started_at: Utc::now(),
        }
    }

    pub fn airport(&self) -> &AirportRef {
        &self.airport
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// ICAO24 addresses to pass to the state source.
    pub fn upstream_filter(&self) -> Option<Vec<String>> {
        self.match_set.upstream_icao24_filter()
    }

    pub fn tracker(&self) -> &AircraftTracker {
        &self.tracker
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Runs a successful poll through the tracker and emitter.
    pub fn apply_snapshot(&mut self, snapshot: &StateSnapshot, now: DateTime<Utc>) -> PollOutcome {
        let update = self.tracker.update(&snapshot.states, &self.match_set, now);
        let new_events = self.emitter.emit(&update.deltas, now);
        self.log.append(new_events.iter().cloned());
        self.current = update.current.clone();

        self.stats.polls += 1;
        self.stats.last_poll = Some(now);
        self.stats.last_error = None;
        self.stats.rate_limited_until = None;
        if snapshot.rate_limit_remaining.is_some() {
            self.stats.rate_limit_remaining = snapshot.rate_limit_remaining;
        }

        tracing::debug!(
            received = snapshot.states.len(),
            accepted = update.current.len(),
            tracked = self.tracker.len(),
            events = new_events.len(),
            "Poll applied"
        );

        PollOutcome {
            current: update.current,
            new_events,
        }
    }

    /// Records a transient failure. Counts as a poll without sightings.
    pub fn apply_failed_poll(&mut self, error: &str, now: DateTime<Utc>) {
        let removed = self.tracker.record_missed_poll();
        self.current.retain(|a| !removed.contains(&a.icao24));
        self.stats.failed_polls += 1;
        self.stats.last_poll = Some(now);
        self.stats.last_error = Some(error.to_string());
    }

    /// Records a rate-limited poll. Tracked state is left untouched.
    pub fn apply_rate_limit(&mut self, resume_at: DateTime<Utc>) {
        self.stats.rate_limited_polls += 1;
        self.stats.rate_limited_until = Some(resume_at);
        self.stats.rate_limit_remaining = Some(0);
    }

    /// Empties the event log.
    pub fn clear_events(&mut self) {
        tracing::info!(cleared = self.log.len(), "Event log cleared");
        self.log.clear();
    }

    /// Replaces the filter.
    ///
    /// Aircraft that no longer match age out through the miss counter.
    pub fn set_filter(&mut self, spec: FilterSpec, match_set: MatchSet) {
        tracing::info!(filter = %spec, "Filter changed");
        self.filter_spec = spec;
        self.match_set = match_set;
    }

    /// Immutable copy of the current state.
    pub fn snapshot(&self, running: bool) -> SessionSnapshot {
        SessionSnapshot {
            running,
            airport: self.airport.clone(),
            bbox: self.bbox,
            interval_secs: self.interval.as_secs(),
            filter: self.filter_spec.to_string(),
            aircraft: self.current.clone(),
            tracked: self.tracker.len(),
            events: self.log.shared(),
            takeoffs: self.log.count(EventType::Takeoff),
            landings: self.log.count(EventType::Landing),
            stats: self.stats.clone(),
            started_at: self.started_at,
        }
    }
}

/// Read-only view of a session, published after every poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Whether the poll loop is still running.
    pub running: bool,
    pub airport: AirportRef,
    pub bbox: BoundingBox,
    pub interval_secs: u64,
    /// Human-readable filter description.
    pub filter: String,
    /// Aircraft accepted in the latest successful poll.
    pub aircraft: Vec<TrackedAircraft>,
    /// Aircraft remembered by the tracker, including recently missed ones.
    pub tracked: usize,
    /// Session event log, shared with the poll loop until it changes.
    pub events: Arc<Vec<Event>>,
    pub takeoffs: usize,
    pub landings: usize,
    pub stats: SessionStats,
    pub started_at: DateTime<Utc>,
}
