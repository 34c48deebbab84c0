//! Scripted snapshot source.
//!
//! Hands out a fixed sequence of fetch results, one per call. Once the script
//! runs out every further fetch returns an empty snapshot. Requests are
//! recorded so callers can check which bounding box and upstream filter the
//! monitor asked for.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use parking_lot::Mutex;

use super::{parse_states, BoxFuture, FetchError, StateSnapshot, StateSource, StateVector};
use crate::coord::BoundingBox;
use crate::reference::ReferenceError;

/// A fetch request as seen by the replay source.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayRequest {
    pub bbox: BoundingBox,
    pub icao24_filter: Option<Vec<String>>,
}

/// Replays canned snapshots.
#[derive(Debug, Default)]
pub struct ReplaySource {
    script: Mutex<VecDeque<Result<StateSnapshot, FetchError>>>,
    requests: Mutex<Vec<ReplayRequest>>,
}

impl ReplaySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source that replays these snapshots in order.
    pub fn from_snapshots(snapshots: impl IntoIterator<Item = Vec<StateVector>>) -> Self {
        let source = Self::new();
        for states in snapshots {
            source.push_states(states);
        }
        source
    }

    /// Loads a recording: one OpenSky `/states/all` response body per line.
    ///
    /// Blank lines are skipped.
    pub fn from_recording(path: &Path) -> Result<Self, ReferenceError> {
        let file = File::open(path).map_err(|source| ReferenceError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let source = Self::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| ReferenceError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let states = parse_states(line.as_bytes()).map_err(|e| ReferenceError::Invalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            source.push_states(states);
        }

        tracing::info!(path = %path.display(), snapshots = source.remaining(), "Loaded recording");
        Ok(source)
    }

    /// Appends a successful snapshot.
    pub fn push_states(&self, states: Vec<StateVector>) {
        self.script.lock().push_back(Ok(StateSnapshot::new(states)));
    }

    /// Appends an arbitrary fetch result, typically an error.
    pub fn push_result(&self, result: Result<StateSnapshot, FetchError>) {
        self.script.lock().push_back(result);
    }

    /// Number of scripted results not yet handed out.
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ReplayRequest> {
        self.requests.lock().clone()
    }
}

impl StateSource for ReplaySource {
    fn fetch(
        &self,
        bbox: BoundingBox,
        icao24_filter: Option<Vec<String>>,
    ) -> BoxFuture<'_, Result<StateSnapshot, FetchError>> {
        self.requests.lock().push(ReplayRequest {
            bbox,
            icao24_filter,
        });
        let next = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(StateSnapshot::default()));
        Box::pin(async move { next })
    }

    fn name(&self) -> &str {
        "replay"
    }
}
