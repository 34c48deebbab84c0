//! The poll loop.
//!
//! One task per session runs fetch → filter → track → emit strictly in
//! sequence, so the session needs no locking. Between polls it answers
//! commands and watches for shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::filter::{FilterSpec, MatchSet};
use crate::source::{FetchError, StateSource};

use super::backoff::Backoff;
use super::message::{MonitorMessage, RateLimitNotice};
use super::schedule::next_deadline;
use super::session::{MonitorSession, SessionSnapshot};

/// Latest published session view, shared with readers.
pub(crate) type SharedSnapshot = Arc<RwLock<Option<Arc<SessionSnapshot>>>>;

/// Requests applied by the loop between polls.
#[derive(Debug)]
pub(crate) enum Command {
    ClearEvents {
        done: oneshot::Sender<()>,
    },
    SetFilter {
        spec: FilterSpec,
        match_set: MatchSet,
        done: oneshot::Sender<()>,
    },
}

pub(crate) struct PollLoop {
    source: Arc<dyn StateSource>,
    session: MonitorSession,
    backoff: Backoff,
    published: SharedSnapshot,
    messages: broadcast::Sender<MonitorMessage>,
}

impl PollLoop {
    pub(crate) fn new(
        source: Arc<dyn StateSource>,
        session: MonitorSession,
        backoff: Backoff,
        published: SharedSnapshot,
        messages: broadcast::Sender<MonitorMessage>,
    ) -> Self {
        Self {
            source,
            session,
            backoff,
            published,
            messages,
        }
    }

    /// Polls until `shutdown` is cancelled and returns the final view.
    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        shutdown: CancellationToken,
    ) -> SessionSnapshot {
        let interval = self.session.interval();
        info!(
            airport = %self.session.airport().code,
            bbox = %self.session.bbox(),
            interval_secs = interval.as_secs(),
            source = self.source.name(),
            "Monitor started"
        );
        self.publish(true);

        let mut deadline = Instant::now();
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!("Shutdown requested");
                    break;
                }

                Some(command) = commands.recv() => {
                    self.handle_command(command);
                }

                _ = tokio::time::sleep_until(deadline) => {
                    let retry = self.poll_once().await;
                    let now = Instant::now();
                    deadline = match retry {
                        Some(delay) => now + delay,
                        None => next_deadline(deadline, interval, now),
                    };
                }
            }
        }

        let stats = self.session.stats();
        info!(
            polls = stats.polls,
            failed = stats.failed_polls,
            rate_limited = stats.rate_limited_polls,
            events = self.session.event_log().len(),
            "Monitor stopped"
        );
        self.publish(false)
    }

    /// Runs one poll. Returns the backoff delay when the poll failed.
    async fn poll_once(&mut self) -> Option<Duration> {
        let bbox = self.session.bbox();
        let upstream = self.session.upstream_filter();

        let result = self.source.fetch(bbox, upstream).await;
        let now = Utc::now();

        match result {
            Ok(snapshot) => {
                self.backoff.reset();
                let outcome = self.session.apply_snapshot(&snapshot, now);
                self.publish(true);

                self.send(MonitorMessage::AircraftUpdate(outcome.current));
                if !outcome.new_events.is_empty() {
                    self.send(MonitorMessage::NewEvents(outcome.new_events));
                }
                if let Some(remaining) = snapshot.rate_limit_remaining {
                    self.send(MonitorMessage::RateLimit(RateLimitNotice::quota(remaining)));
                }
                None
            }
            Err(FetchError::RateLimited { retry_after }) => {
                let delay = self.backoff.next_delay(Some(retry_after));
                let resume_at = now
                    + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
                info!(
                    retry_after_secs = delay.as_secs(),
                    failures = self.backoff.failures(),
                    "Rate limited, pausing polls"
                );
                self.session.apply_rate_limit(resume_at);
                self.publish(true);

                self.send(MonitorMessage::RateLimit(RateLimitNotice::paused(
                    delay.as_secs(),
                    resume_at,
                )));
                Some(delay)
            }
            Err(FetchError::Transient(reason)) => {
                let delay = self.backoff.next_delay(None);
                warn!(
                    error = %reason,
                    retry_in_secs = delay.as_secs(),
                    failures = self.backoff.failures(),
                    "Poll failed"
                );
                self.session.apply_failed_poll(&reason, now);
                self.publish(true);
                Some(delay)
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::ClearEvents { done } => {
                self.session.clear_events();
                self.publish(true);
                let _ = done.send(());
            }
            Command::SetFilter {
                spec,
                match_set,
                done,
            } => {
                self.session.set_filter(spec, match_set);
                self.publish(true);
                let _ = done.send(());
            }
        }
    }

    fn publish(&self, running: bool) -> SessionSnapshot {
        let snapshot = self.session.snapshot(running);
        *self.published.write() = Some(Arc::new(snapshot.clone()));
        snapshot
    }

    fn send(&self, message: MonitorMessage) {
        // No subscribers is fine.
        let _ = self.messages.send(message);
    }
}
