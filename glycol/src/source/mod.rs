//! Upstream state-vector sources
//!
//! The monitor treats the flight-tracking API as a black box that returns the
//! state vectors inside a bounding box. [`StateSource`] is that seam:
//!
//! - [`OpenSkyClient`]: the OpenSky Network REST API
//! - [`ReplaySource`]: replays scripted or recorded snapshots (offline runs, tests)
//!
//! # Errors
//!
//! A fetch either succeeds, is rate limited, or fails transiently. Neither
//! failure is fatal: the poll loop backs off and tries again.

mod opensky;
mod replay;
mod state;

pub use opensky::{parse_states, retry_after_from_headers, OpenSkyClient, OpenSkyConfig};
pub use replay::{ReplayRequest, ReplaySource};
pub use state::{
    normalize_callsign, normalize_icao24, StateVector, FEET_PER_METER, KNOTS_PER_MPS,
};

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use crate::coord::BoundingBox;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors returned by a state source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The API refused the request because the quota is exhausted.
    #[error("rate limited, retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// Network or API hiccup.
    #[error("transient fetch error: {0}")]
    Transient(String),
}

/// One successful poll of the upstream API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot {
    /// State vectors inside the requested box.
    pub states: Vec<StateVector>,
    /// Remaining request quota, when the API reports it.
    pub rate_limit_remaining: Option<u32>,
}

impl StateSnapshot {
    /// Creates a snapshot without quota information.
    pub fn new(states: Vec<StateVector>) -> Self {
        Self {
            states,
            rate_limit_remaining: None,
        }
    }
}

/// A source of state-vector snapshots.
///
/// Implementations must be `Send + Sync`; the poll loop holds them in an `Arc`.
pub trait StateSource: Send + Sync {
    /// Fetches the aircraft inside `bbox`.
    ///
    /// `icao24_filter`, when present, restricts the response to those
    /// addresses. Sources that cannot filter upstream may ignore it; the
    /// monitor applies its own filter afterwards.
    fn fetch(
        &self,
        bbox: BoundingBox,
        icao24_filter: Option<Vec<String>>,
    ) -> BoxFuture<'_, Result<StateSnapshot, FetchError>>;

    /// Short name for logs and banners.
    fn name(&self) -> &str;
}
