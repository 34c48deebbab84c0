//! Presentation-facing monitor service.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::ConfigError;
use crate::events::Event;
use crate::filter::{resolve, FilterSpec, MatchSet};
use crate::reference::{AircraftRegistry, AirportLookup, AirportRef, TypeGroupLookup};
use crate::source::StateSource;
use crate::tracker::TrackedAircraft;

use super::backoff::Backoff;
use super::config::{validate_interval, MonitorConfig};
use super::poller::{Command, PollLoop, SharedSnapshot};
use super::session::{MonitorSession, SessionSnapshot};
use super::{MonitorError, MonitorMessage, MonitorStatus};

struct RunningSession {
    shutdown: CancellationToken,
    commands: mpsc::Sender<Command>,
    handle: JoinHandle<SessionSnapshot>,
}

impl Drop for RunningSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Starts, stops and observes monitoring sessions.
///
/// At most one session runs at a time. Starting a new session stops the
/// previous one. Readers get copies of the latest published
/// [`SessionSnapshot`] and never block the poll loop for longer than an
/// `Arc` clone.
///
/// # Example
///
/// ```ignore
/// let mut service = MonitorService::new(config, source, airports, groups, registry);
/// let mut messages = service.subscribe();
/// service.start("KSFO", FilterSpec::None, Duration::from_secs(10)).await?;
///
/// while let Ok(message) = messages.recv().await {
///     println!("{}", message.to_json()?);
/// }
/// ```
pub struct MonitorService {
    config: MonitorConfig,
    source: Arc<dyn StateSource>,
    airports: Arc<dyn AirportLookup>,
    groups: Arc<dyn TypeGroupLookup>,
    registry: Arc<dyn AircraftRegistry>,
    messages: broadcast::Sender<MonitorMessage>,
    published: SharedSnapshot,
    running: Option<RunningSession>,
}

impl MonitorService {
    /// Creates an idle service.
    pub fn new(
        config: MonitorConfig,
        source: Arc<dyn StateSource>,
        airports: Arc<dyn AirportLookup>,
        groups: Arc<dyn TypeGroupLookup>,
        registry: Arc<dyn AircraftRegistry>,
    ) -> Self {
        let (messages, _) = broadcast::channel(config.message_capacity.max(1));
        Self {
            config,
            source,
            airports,
            groups,
            registry,
            messages,
            published: Arc::new(RwLock::new(None)),
            running: None,
        }
    }

    /// Starts monitoring an airport from the airport database.
    pub async fn start(
        &mut self,
        airport_code: &str,
        filter: FilterSpec,
        interval: Duration,
    ) -> Result<(), MonitorError> {
        let airport = self
            .airports
            .lookup(airport_code)
            .ok_or_else(|| ConfigError::UnknownAirport(airport_code.trim().to_uppercase()))?;
        self.start_at(airport, filter, interval).await
    }

    /// Starts monitoring an explicit reference point.
    ///
    /// Nothing is started unless the interval, settings and filter are all
    /// valid. A session that is already running is stopped first; if its
    /// task had failed, the failure is logged and the new session starts.
    pub async fn start_at(
        &mut self,
        airport: AirportRef,
        filter: FilterSpec,
        interval: Duration,
    ) -> Result<(), MonitorError> {
        let interval = validate_interval(interval)?;
        self.config.validate()?;
        let match_set = self.resolve_filter(&filter)?;

        if let Some(previous) = self.running.take() {
            if let Err(e) = self.finish(previous).await {
                warn!(error = %e, "Previous session ended abnormally");
            }
        }

        let session = MonitorSession::new(
            airport,
            self.config.radius_nm,
            interval,
            filter,
            match_set,
            self.config.tracker,
        );
        let poll_loop = PollLoop::new(
            Arc::clone(&self.source),
            session,
            Backoff::new(self.config.backoff),
            Arc::clone(&self.published),
            self.messages.clone(),
        );

        let (commands, command_rx) = mpsc::channel(self.config.command_capacity.max(1));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(poll_loop.run(command_rx, shutdown.clone()));

        self.running = Some(RunningSession {
            shutdown,
            commands,
            handle,
        });
        Ok(())
    }

    /// Stops the running session and returns its final state.
    ///
    /// An in-flight poll completes before the loop exits.
    pub async fn stop(&mut self) -> Result<Arc<SessionSnapshot>, MonitorError> {
        let running = self.running.take().ok_or(MonitorError::NotRunning)?;
        self.finish(running).await
    }

    async fn finish(
        &self,
        mut running: RunningSession,
    ) -> Result<Arc<SessionSnapshot>, MonitorError> {
        running.shutdown.cancel();

        let snapshot = (&mut running.handle)
            .await
            .map_err(|e| MonitorError::TaskFailed(e.to_string()))?;
        let snapshot = Arc::new(snapshot);
        *self.published.write() = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Whether a session is running.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .map(|r| !r.handle.is_finished())
            .unwrap_or(false)
    }

    /// Latest published view of the current or last session.
    pub fn snapshot(&self) -> Option<Arc<SessionSnapshot>> {
        self.published.read().clone()
    }

    /// Aircraft accepted in the latest successful poll.
    pub fn current_aircraft(&self) -> Vec<TrackedAircraft> {
        self.snapshot()
            .map(|s| s.aircraft.clone())
            .unwrap_or_default()
    }

    /// Copy of the session event log.
    pub fn events(&self) -> Vec<Event> {
        self.snapshot()
            .map(|s| s.events.as_ref().clone())
            .unwrap_or_default()
    }

    /// Empties the session event log.
    pub async fn clear_events(&self) -> Result<(), MonitorError> {
        let (done, ack) = oneshot::channel();
        self.send_command(Command::ClearEvents { done }, ack).await
    }

    /// Replaces the filter of the running session.
    ///
    /// The filter is resolved here, so an invalid one leaves the session
    /// unchanged.
    pub async fn set_filter(&self, spec: FilterSpec) -> Result<(), MonitorError> {
        if self.running.is_none() {
            return Err(MonitorError::NotRunning);
        }
        let match_set = self.resolve_filter(&spec)?;
        let (done, ack) = oneshot::channel();
        self.send_command(
            Command::SetFilter {
                spec,
                match_set,
                done,
            },
            ack,
        )
        .await
    }

    /// Summary of the current or last session.
    pub fn status(&self) -> MonitorStatus {
        MonitorStatus::from_snapshot(self.snapshot().as_deref(), self.is_running())
    }

    /// Subscribes to push messages.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorMessage> {
        self.messages.subscribe()
    }

    fn resolve_filter(&self, spec: &FilterSpec) -> Result<MatchSet, MonitorError> {
        Ok(resolve(
            spec,
            self.groups.as_ref(),
            Arc::clone(&self.registry),
        )?)
    }

    async fn send_command(
        &self,
        command: Command,
        ack: oneshot::Receiver<()>,
    ) -> Result<(), MonitorError> {
        let running = self.running.as_ref().ok_or(MonitorError::NotRunning)?;
        running
            .commands
            .send(command)
            .await
            .map_err(|_| MonitorError::NotRunning)?;
        ack.await.map_err(|_| MonitorError::NotRunning)
    }
}

impl std::fmt::Debug for MonitorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorService")
            .field("config", &self.config)
            .field("source", &self.source.name())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterError;
    use crate::reference::{AircraftDatabase, AirportDatabase, TypeGroupsDatabase};
    use crate::coord::BoundingBox;
    use crate::source::{BoxFuture, FetchError, ReplaySource, StateSnapshot};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Panics on its first fetch, then returns empty snapshots.
    #[derive(Default)]
    struct PanicOnceSource {
        panicked: AtomicBool,
        fetches: AtomicUsize,
    }

    impl StateSource for PanicOnceSource {
        fn fetch(
            &self,
            _bbox: BoundingBox,
            _icao24: Option<Vec<String>>,
        ) -> BoxFuture<'_, Result<StateSnapshot, FetchError>> {
            Box::pin(async move {
                if !self.panicked.swap(true, Ordering::SeqCst) {
                    panic!("source crashed");
                }
                self.fetches.fetch_add(1, Ordering::SeqCst);
                Ok(StateSnapshot::default())
            })
        }

        fn name(&self) -> &str {
            "panic-once"
        }
    }

    fn service() -> MonitorService {
        let airports: AirportDatabase =
            vec![AirportRef::new("KSFO", "San Francisco", 37.6213, -122.379).unwrap()]
                .into_iter()
                .collect();
        MonitorService::new(
            MonitorConfig::default(),
            Arc::new(ReplaySource::new()),
            Arc::new(airports),
            Arc::new(TypeGroupsDatabase::new()),
            Arc::new(AircraftDatabase::new()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_airport_does_not_start() {
        let mut service = service();
        let err = service
            .start("ZZZZ", FilterSpec::None, Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MonitorError::Config(ConfigError::UnknownAirport(ref code)) if code == "ZZZZ"
        ));
        assert!(!service.is_running());
        assert!(service.snapshot().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_out_of_range() {
        let mut service = service();
        let err = service
            .start("KSFO", FilterSpec::None, Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MonitorError::Config(ConfigError::InvalidInterval { .. })
        ));
        assert!(!service.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_group_blocks_start() {
        let mut service = service();
        let err = service
            .start(
                "ksfo",
                FilterSpec::ByTypeGroup(vec!["gliders".to_string()]),
                Duration::from_secs(10),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MonitorError::Filter(FilterError::UnknownTypeReferences(_))
        ));
        assert!(!service.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_without_session() {
        let mut service = service();
        assert!(matches!(service.stop().await, Err(MonitorError::NotRunning)));
        assert!(matches!(
            service.clear_events().await,
            Err(MonitorError::NotRunning)
        ));
        assert!(matches!(
            service.set_filter(FilterSpec::None).await,
            Err(MonitorError::NotRunning)
        ));
        assert!(!service.status().running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_stop() {
        let mut service = service();
        service
            .start("ksfo", FilterSpec::None, Duration::from_secs(10))
            .await
            .unwrap();
        assert!(service.is_running());

        tokio::time::sleep(Duration::from_secs(25)).await;

        let last = service.stop().await.unwrap();
        assert!(!last.running);
        assert_eq!(last.airport.code, "KSFO");
        assert!(last.stats.polls >= 2);
        assert!(!service.is_running());
        assert!(!service.status().running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_failed_task() {
        let source = Arc::new(PanicOnceSource::default());
        let airports: AirportDatabase =
            vec![AirportRef::new("KSFO", "San Francisco", 37.6213, -122.379).unwrap()]
                .into_iter()
                .collect();
        let mut service = MonitorService::new(
            MonitorConfig::default(),
            Arc::clone(&source) as Arc<dyn StateSource>,
            Arc::new(airports),
            Arc::new(TypeGroupsDatabase::new()),
            Arc::new(AircraftDatabase::new()),
        );

        service
            .start("KSFO", FilterSpec::None, Duration::from_secs(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!service.is_running());

        service
            .start("KSFO", FilterSpec::None, Duration::from_secs(10))
            .await
            .unwrap();
        assert!(service.is_running());

        tokio::time::sleep(Duration::from_secs(15)).await;
        let last = service.stop().await.unwrap();
        assert!(last.stats.polls >= 1);
        assert!(source.fetches.load(Ordering::SeqCst) >= 1);
    }
}
