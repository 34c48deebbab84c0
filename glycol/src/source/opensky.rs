//! OpenSky Network REST client.
//!
//! Queries `GET /states/all` with a bounding box and optional ICAO24 filter.
//! Responses carry state vectors as positional JSON arrays:
//!
//! ```text
//! 0 icao24   1 callsign   2 origin_country   3 time_position   4 last_contact
//! 5 longitude   6 latitude   7 baro_altitude   8 on_ground   9 velocity
//! 10 true_track   11 vertical_rate   12 sensors   13 geo_altitude
//! 14 squawk   15 spi   16 position_source   17 category (extended only)
//! ```
//!
//! Token acquisition is not handled here. A pre-issued bearer token can be
//! supplied through [`OpenSkyConfig::token`].

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use super::state::{normalize_callsign, normalize_icao24};
use super::{BoxFuture, FetchError, StateSnapshot, StateSource, StateVector};
use crate::config::{ConfigError, OpenSkySettings, DEFAULT_OPENSKY_TIMEOUT_SECS, DEFAULT_OPENSKY_URL};
use crate::coord::BoundingBox;

/// Wait applied to a 429 response that carries no retry hint.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(10);

const RATE_LIMIT_REMAINING_HEADER: &str = "x-rate-limit-remaining";
const RATE_LIMIT_RETRY_AFTER_HEADER: &str = "x-rate-limit-retry-after-seconds";
const RETRY_AFTER_HEADER: &str = "retry-after";

/// Connection settings for [`OpenSkyClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct OpenSkyConfig {
    /// API root, without trailing slash.
    pub base_url: String,
    /// Bearer token for authenticated quotas.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Request extended state vectors (adds the emitter category).
    pub extended: bool,
}

impl Default for OpenSkyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENSKY_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_OPENSKY_TIMEOUT_SECS),
            extended: true,
        }
    }
}

impl OpenSkyConfig {
    /// Builds the client config from the `[opensky]` section.
    pub fn from_settings(settings: &OpenSkySettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            token: settings.token.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
            extended: true,
        }
    }
}

/// OpenSky Network state-vector client.
pub struct OpenSkyClient {
    client: reqwest::Client,
    config: OpenSkyConfig,
}

impl std::fmt::Debug for OpenSkyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSkyClient")
            .field("base_url", &self.config.base_url)
            .field("authenticated", &self.config.token.is_some())
            .finish_non_exhaustive()
    }
}

impl OpenSkyClient {
    /// Creates a client.
    pub fn new(config: OpenSkyConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("glycol/{}", crate::VERSION))
            .build()
            .map_err(|e| ConfigError::InvalidSetting {
                key: "opensky".to_string(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    async fn fetch_states(
        &self,
        bbox: BoundingBox,
        icao24_filter: Option<Vec<String>>,
    ) -> Result<StateSnapshot, FetchError> {
        let url = format!("{}/states/all", self.config.base_url);
        let (lamin, lamax, lomin, lomax) = bbox.as_tuple();

        let mut query: Vec<(&str, String)> = vec![
            ("lamin", lamin.to_string()),
            ("lamax", lamax.to_string()),
            ("lomin", lomin.to_string()),
            ("lomax", lomax.to_string()),
        ];
        if self.config.extended {
            query.push(("extended", "1".to_string()));
        }
        for icao24 in icao24_filter.into_iter().flatten() {
            query.push(("icao24", icao24));
        }

        let mut request = self.client.get(&url).query(&query);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transient(format!("request failed: {}", e)))?;

        let status = response.status();
        let remaining = response
            .headers()
            .get(RATE_LIMIT_REMAINING_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u32>().ok());

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                retry_after: retry_after_from_headers(response.headers()),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Transient(format!("HTTP {} from {}", status, url)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transient(format!("failed to read response: {}", e)))?;

        let states = parse_states(&body)?;
        tracing::debug!(count = states.len(), remaining = ?remaining, "Fetched state vectors");

        Ok(StateSnapshot {
            states,
            rate_limit_remaining: remaining,
        })
    }
}

impl StateSource for OpenSkyClient {
    fn fetch(
        &self,
        bbox: BoundingBox,
        icao24_filter: Option<Vec<String>>,
    ) -> BoxFuture<'_, Result<StateSnapshot, FetchError>> {
        Box::pin(self.fetch_states(bbox, icao24_filter))
    }

    fn name(&self) -> &str {
        "OpenSky Network"
    }
}

/// Reads the wait requested by a 429 response.
///
/// Prefers OpenSky's own header, then the standard `Retry-After` (seconds
/// form), then [`DEFAULT_RETRY_AFTER`].
pub fn retry_after_from_headers(headers: &HeaderMap) -> Duration {
    [RATE_LIMIT_RETRY_AFTER_HEADER, RETRY_AFTER_HEADER]
        .iter()
        .find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
        })
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

#[derive(Debug, Deserialize)]
struct StatesResponse {
    #[serde(default)]
    states: Option<Vec<Vec<Value>>>,
}

/// Parses a `/states/all` response body.
///
/// Rows without an ICAO24 address or a boolean ground flag are skipped.
/// `"states": null` (no aircraft in the box) yields an empty list.
pub fn parse_states(body: &[u8]) -> Result<Vec<StateVector>, FetchError> {
    let response: StatesResponse = serde_json::from_slice(body)
        .map_err(|e| FetchError::Transient(format!("malformed states response: {}", e)))?;

    Ok(response
        .states
        .unwrap_or_default()
        .iter()
        .filter_map(|row| parse_row(row))
        .collect())
}

fn parse_row(row: &[Value]) -> Option<StateVector> {
    let field = |i: usize| row.get(i).filter(|v| !v.is_null());
    let number = |i: usize| field(i).and_then(Value::as_f64);
    let text = |i: usize| field(i).and_then(Value::as_str);

    let icao24 = normalize_icao24(text(0)?);
    if icao24.is_empty() {
        return None;
    }
    let Some(on_ground) = field(8).and_then(Value::as_bool) else {
        tracing::debug!(icao24 = %icao24, "Skipping state vector without ground flag");
        return None;
    };

    Some(StateVector {
        icao24,
        callsign: normalize_callsign(text(1)),
        origin_country: text(2).map(str::to_string),
        longitude: number(5),
        latitude: number(6),
        baro_altitude: number(7),
        on_ground,
        velocity: number(9),
        true_track: number(10),
        vertical_rate: number(11),
        squawk: text(14).map(str::to_string),
        category: field(17)
            .and_then(Value::as_u64)
            .and_then(|c| u8::try_from(c).ok()),
    })
}
