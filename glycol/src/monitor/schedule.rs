//! Poll tick scheduling.
//!
//! Ticks fall on a fixed grid `start + k × interval`. A poll that overruns
//! one or more ticks does not queue them up: the next poll waits for the
//! first grid point still in the future.

use std::time::Duration;

use tokio::time::Instant;

/// Returns the first tick after `now` on the grid anchored at `scheduled`.
pub fn next_deadline(scheduled: Instant, interval: Duration, now: Instant) -> Instant {
    if interval.is_zero() {
        return now;
    }

    let next = scheduled + interval;
    if next > now {
        return next;
    }

    let behind = now.saturating_duration_since(scheduled);
    let elapsed_ticks = behind.as_nanos() / interval.as_nanos();
    let ticks = u32::try_from(elapsed_ticks + 1).unwrap_or(u32::MAX);
    tracing::debug!(skipped = ticks - 1, "Poll overran, skipping ticks");

    scheduled + interval.saturating_mul(ticks)
}
