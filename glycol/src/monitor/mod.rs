//! Airport monitoring sessions
//!
//! This module ties the engine together. A [`MonitorService`] owns at most
//! one running session. Each session is a tokio task that polls a
//! [`StateSource`](crate::source::StateSource) on a fixed grid and pushes
//! every snapshot through the filter, the tracker and the event emitter.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        MonitorService                             │
//! │                                                                   │
//! │  start/stop ──► CancellationToken                                 │
//! │  clear_events/set_filter ──► mpsc::Sender<Command> ───┐           │
//! │                                                        ▼           │
//! │                ┌───────────────────── PollLoop (task) ─────────┐  │
//! │                │ select! { shutdown | command | next tick }    │  │
//! │                │   fetch ─► MonitorSession ─► publish          │  │
//! │                │            (tracker, filter, event log)       │  │
//! │                └──────────────┬──────────────────┬─────────────┘  │
//! │                               ▼                  ▼                │
//! │        RwLock<Arc<SessionSnapshot>>     broadcast<MonitorMessage> │
//! │        current_aircraft/events/status   subscribe()               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Failure handling
//!
//! No error inside a poll stops the loop:
//!
//! - Rate limited: wait for the backoff delay (at least the server's
//!   retry-after), publish a `rate_limit` message, keep tracked state.
//! - Transient failure: log a warning, back off, count a missed poll.
//! - Success: reset the backoff.

mod backoff;
mod config;
mod message;
mod poller;
mod schedule;
mod service;
mod session;

pub use backoff::{Backoff, BackoffConfig};
pub use config::{
    validate_interval, MonitorConfig, DEFAULT_COMMAND_CAPACITY, DEFAULT_MESSAGE_CAPACITY,
    MAX_INTERVAL_SECS, MIN_INTERVAL_SECS,
};
pub use message::{MonitorMessage, RateLimitNotice};
pub use schedule::next_deadline;
pub use service::MonitorService;
pub use session::{MonitorSession, PollOutcome, SessionSnapshot, SessionStats};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::filter::FilterError;

/// Errors returned by [`MonitorService`].
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Invalid airport, interval or settings. Nothing was started.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The filter could not be resolved.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// The command needs a running session.
    #[error("monitor is not running")]
    NotRunning,

    /// The poll task panicked or was aborted.
    #[error("monitor task failed: {0}")]
    TaskFailed(String),
}

/// Compact status for status endpoints and banners.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonitorStatus {
    pub running: bool,
    pub airport: Option<String>,
    pub airport_name: Option<String>,
    pub filter: Option<String>,
    pub interval_secs: Option<u64>,
    /// Aircraft accepted in the latest poll.
    pub aircraft: usize,
    pub events: usize,
    pub takeoffs: usize,
    pub landings: usize,
    pub polls: u64,
    pub failed_polls: u64,
    pub last_poll: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub rate_limited_until: Option<DateTime<Utc>>,
    pub rate_limit_remaining: Option<u32>,
}

impl MonitorStatus {
    /// Builds a status from the latest snapshot, if any.
    pub fn from_snapshot(snapshot: Option<&SessionSnapshot>, running: bool) -> Self {
        let Some(snapshot) = snapshot else {
            return Self::default();
        };

        Self {
            running,
            airport: Some(snapshot.airport.code.clone()),
            airport_name: Some(snapshot.airport.name.clone()),
            filter: Some(snapshot.filter.clone()),
            interval_secs: Some(snapshot.interval_secs),
            aircraft: snapshot.aircraft.len(),
            events: snapshot.events.len(),
            takeoffs: snapshot.takeoffs,
            landings: snapshot.landings,
            polls: snapshot.stats.polls,
            failed_polls: snapshot.stats.failed_polls,
            last_poll: snapshot.stats.last_poll,
            last_error: snapshot.stats.last_error.clone(),
            rate_limited_until: snapshot.stats.rate_limited_until,
            rate_limit_remaining: snapshot.stats.rate_limit_remaining,
        }
    }
}
