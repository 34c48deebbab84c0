//! Glycol - Airport takeoff and landing monitor
//!
//! This library watches the airspace around a single airport using periodic
//! ADS-B state-vector snapshots (OpenSky Network) and turns changes in each
//! aircraft's ground-contact flag into a clean stream of takeoff and landing
//! events.
//!
//! # Architecture
//!
//! ```text
//! StateSource ──► MatchSet filter ──► AircraftTracker ──► EventEmitter ──► EventLog
//!  (fetch)         (filter)            (ground deltas)     (events)          (session)
//!                                                 │
//!                                                 └──► SessionSnapshot ──► MonitorService readers
//! ```
//!
//! The poll loop in [`monitor`] owns all mutable state. Presentation layers
//! read immutable snapshots and subscribe to push messages.

pub mod config;
pub mod coord;
pub mod events;
pub mod filter;
pub mod logging;
pub mod monitor;
pub mod reference;
pub mod source;
pub mod tracker;

/// Crate version, used in CLI banners and the HTTP user agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
