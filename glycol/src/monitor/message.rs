//! Push messages for subscribers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::events::Event;
use crate::tracker::TrackedAircraft;

/// A message published after each poll.
///
/// Serialises as `{"type": "...", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MonitorMessage {
    /// Aircraft accepted in the latest successful poll.
    AircraftUpdate(Vec<TrackedAircraft>),
    /// Events detected in the latest poll.
    NewEvents(Vec<Event>),
    /// Request quota after a successful poll, or a rate-limit pause.
    RateLimit(RateLimitNotice),
}

/// Rate-limit state reported by the upstream API.
///
/// A quota notice carries only `remaining`. A pause also carries the wait
/// and the resume time, with `remaining` at zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitNotice {
    /// Requests left in the current quota window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    /// Seconds until the next attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    /// When polling resumes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_at: Option<DateTime<Utc>>,
}

impl RateLimitNotice {
    /// Remaining quota after a successful poll.
    pub fn quota(remaining: u32) -> Self {
        Self {
            remaining: Some(remaining),
            retry_after_secs: None,
            resume_at: None,
        }
    }

    /// Polling is paused until `resume_at`.
    pub fn paused(retry_after_secs: u64, resume_at: DateTime<Utc>) -> Self {
        Self {
            remaining: Some(0),
            retry_after_secs: Some(retry_after_secs),
            resume_at: Some(resume_at),
        }
    }

    pub fn is_pause(&self) -> bool {
        self.retry_after_secs.is_some()
    }
}

impl MonitorMessage {
    /// Message type as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AircraftUpdate(_) => "aircraft_update",
            Self::NewEvents(_) => "new_events",
            Self::RateLimit(_) => "rate_limit",
        }
    }

    /// Serialises to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
