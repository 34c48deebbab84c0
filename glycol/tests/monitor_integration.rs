//! End-to-end monitor runs against scripted snapshots.
//!
//! Time is paused, so the poll loop advances in whole intervals: with a 10s
//! interval, sleeping 35s covers the polls at t=0, 10, 20 and 30.

use std::sync::Arc;
use std::time::Duration;

use glycol::events::{Event, EventType};
use glycol::filter::FilterSpec;
use glycol::monitor::{MonitorConfig, MonitorMessage, MonitorService};
use glycol::reference::{AircraftDatabase, AirportDatabase, AirportRef, TypeGroupsDatabase};
use glycol::source::{FetchError, ReplaySource, StateSnapshot, StateVector};
use tokio::sync::broadcast;

const INTERVAL: Duration = Duration::from_secs(10);

fn ksfo() -> AirportRef {
    AirportRef::new("KSFO", "San Francisco International", 37.6213, -122.379).unwrap()
}

fn service_with(
    source: Arc<ReplaySource>,
    registry: AircraftDatabase,
    groups: TypeGroupsDatabase,
) -> MonitorService {
    let airports: AirportDatabase = vec![ksfo()].into_iter().collect();
    MonitorService::new(
        MonitorConfig::default(),
        source,
        Arc::new(airports),
        Arc::new(groups),
        Arc::new(registry),
    )
}

fn service(source: Arc<ReplaySource>) -> MonitorService {
    service_with(source, AircraftDatabase::new(), TypeGroupsDatabase::new())
}

fn on_ground(icao24: &str) -> StateVector {
    StateVector::new(icao24, true)
        .with_callsign("UAL123")
        .with_position(37.6190, -122.3750)
        .with_velocity(5.0)
}

fn airborne(icao24: &str, feet: f64) -> StateVector {
    StateVector::new(icao24, false)
        .with_callsign("UAL123")
        .with_position(37.6300, -122.3600)
        .with_altitude_ft(feet)
        .with_velocity(80.0)
}

fn drain(rx: &mut broadcast::Receiver<MonitorMessage>) -> Vec<MonitorMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}

fn events_in(messages: &[MonitorMessage]) -> Vec<Event> {
    messages
        .iter()
        .filter_map(|m| match m {
            MonitorMessage::NewEvents(events) => Some(events.clone()),
            _ => None,
        })
        .flatten()
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_takeoff_then_landing_is_pushed() {
    let source = Arc::new(ReplaySource::from_snapshots(vec![
        vec![on_ground("abc123")],
        vec![airborne("abc123", 800.0)],
        vec![airborne("abc123", 1200.0)],
        vec![on_ground("abc123")],
    ]));
    let mut service = service(Arc::clone(&source));
    let mut rx = service.subscribe();

    service
        .start("ksfo", FilterSpec::None, INTERVAL)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(35)).await;
    let last = service.stop().await.unwrap();

    let messages = drain(&mut rx);
    let updates = messages
        .iter()
        .filter(|m| matches!(m, MonitorMessage::AircraftUpdate(_)))
        .count();
    assert_eq!(updates, 4);

    let events = events_in(&messages);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, EventType::Takeoff);
    assert_eq!(events[0].icao24, "abc123");
    assert_eq!(events[0].callsign.as_deref(), Some("UAL123"));
    assert_eq!(events[0].airport, "KSFO");
    assert_eq!(events[1].event_type, EventType::Landing);

    assert_eq!(*last.events, events);
    assert_eq!(last.takeoffs, 1);
    assert_eq!(last.landings, 1);
    assert_eq!(last.stats.polls, 4);
    assert_eq!(source.requests().len(), 4);
    assert!(source
        .requests()
        .iter()
        .all(|r| r.bbox == last.bbox && r.icao24_filter.is_none()));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_pauses_without_aging() {
    let source = Arc::new(ReplaySource::new());
    source.push_states(vec![on_ground("abc123")]);
    for _ in 0..3 {
        source.push_result(Err(FetchError::RateLimited {
            retry_after: Duration::from_secs(30),
        }));
    }
    source.push_states(vec![airborne("abc123", 900.0)]);

    let mut service = service(Arc::clone(&source));
    let mut rx = service.subscribe();
    service
        .start("KSFO", FilterSpec::None, INTERVAL)
        .await
        .unwrap();

    // Polls at t=0 (ok), 10, 40, 70 (rate limited), then 110 (ok). The
    // third pause is the doubled backoff, longer than the server's hint.
    tokio::time::sleep(Duration::from_secs(115)).await;
    let last = service.stop().await.unwrap();

    let messages = drain(&mut rx);
    let notices: Vec<_> = messages
        .iter()
        .filter_map(|m| match m {
            MonitorMessage::RateLimit(notice) => Some(notice.clone()),
            _ => None,
        })
        .collect();
    let waits: Vec<u64> = notices.iter().filter_map(|n| n.retry_after_secs).collect();
    assert_eq!(waits, vec![30, 30, 40]);
    assert!(notices.iter().all(|n| n.is_pause()));

    // Three rate-limited polls are not misses, so the aircraft survived.
    let events = events_in(&messages);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::Takeoff);

    assert_eq!(last.stats.rate_limited_polls, 3);
    assert!(last.stats.rate_limited_until.is_none());
    assert_eq!(source.remaining(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_successful_polls_report_remaining_quota() {
    let source = Arc::new(ReplaySource::new());
    source.push_result(Ok(StateSnapshot {
        states: vec![on_ground("abc123")],
        rate_limit_remaining: Some(42),
    }));
    source.push_result(Ok(StateSnapshot {
        states: vec![on_ground("abc123")],
        rate_limit_remaining: Some(41),
    }));

    let mut service = service(Arc::clone(&source));
    let mut rx = service.subscribe();
    service
        .start("KSFO", FilterSpec::None, INTERVAL)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(service.status().rate_limit_remaining, Some(41));
    service.stop().await.unwrap();

    let messages = drain(&mut rx);
    let kinds: Vec<&str> = messages.iter().map(MonitorMessage::kind).collect();
    assert!(kinds.contains(&"rate_limit"));

    let remaining: Vec<u32> = messages
        .iter()
        .filter_map(|m| match m {
            MonitorMessage::RateLimit(notice) if !notice.is_pause() => notice.remaining,
            _ => None,
        })
        .collect();
    assert_eq!(remaining, vec![42, 41]);
}

#[tokio::test(start_paused = true)]
async fn test_transient_errors_count_as_misses() {
    let source = Arc::new(ReplaySource::new());
    source.push_states(vec![on_ground("abc123")]);
    source.push_result(Err(FetchError::Transient("connection reset".to_string())));
    source.push_result(Err(FetchError::Transient("HTTP 503".to_string())));
    source.push_states(vec![airborne("abc123", 700.0)]);

    let mut service = service(Arc::clone(&source));
    let mut rx = service.subscribe();
    service
        .start("KSFO", FilterSpec::None, INTERVAL)
        .await
        .unwrap();

    // Polls at t=0 (ok), 10 and 20 (failed, backoff 10s then 20s), 40 (ok).
    tokio::time::sleep(Duration::from_secs(45)).await;
    let last = service.stop().await.unwrap();

    let events = events_in(&drain(&mut rx));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::Takeoff);
    assert_eq!(last.stats.failed_polls, 2);
    assert!(last.stats.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_reentry_after_removal_starts_fresh() {
    let source = Arc::new(ReplaySource::from_snapshots(vec![
        vec![on_ground("abc123")],
        vec![],
        vec![],
        vec![],
        vec![airborne("abc123", 1200.0)],
        vec![on_ground("abc123")],
    ]));
    let mut service = service(Arc::clone(&source));
    let mut rx = service.subscribe();
    service
        .start("KSFO", FilterSpec::None, INTERVAL)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(55)).await;
    let last = service.stop().await.unwrap();

    // The aircraft was dropped after three misses, so coming back airborne
    // is a first sighting and only the landing is reported.
    let events = events_in(&drain(&mut rx));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::Landing);
    assert_eq!(last.landings, 1);
    assert_eq!(last.takeoffs, 0);
}

#[tokio::test(start_paused = true)]
async fn test_clear_events_empties_log() {
    let source = Arc::new(ReplaySource::from_snapshots(vec![
        vec![on_ground("abc123")],
        vec![airborne("abc123", 600.0)],
    ]));
    let mut service = service(Arc::clone(&source));
    service
        .start("KSFO", FilterSpec::None, INTERVAL)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(service.events().len(), 1);
    assert_eq!(service.status().takeoffs, 1);

    service.clear_events().await.unwrap();
    assert!(service.events().is_empty());
    assert_eq!(service.status().events, 0);
    assert!(service.status().running);

    service.stop().await.unwrap();
    assert!(service.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_identifier_filter_goes_upstream_until_changed() {
    let source = Arc::new(ReplaySource::from_snapshots(vec![
        vec![on_ground("abc123"), on_ground("def456")],
        vec![on_ground("abc123"), on_ground("def456")],
    ]));
    let mut service = service(Arc::clone(&source));
    service
        .start(
            "KSFO",
            FilterSpec::ByIdentifier(vec!["ABC123".to_string()]),
            INTERVAL,
        )
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    let aircraft = service.current_aircraft();
    assert_eq!(aircraft.len(), 1);
    assert_eq!(aircraft[0].icao24, "abc123");

    service.set_filter(FilterSpec::None).await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(service.current_aircraft().len(), 2);
    assert_eq!(service.status().filter.as_deref(), Some("all aircraft"));

    service.stop().await.unwrap();

    let requests = source.requests();
    assert_eq!(requests[0].icao24_filter, Some(vec!["abc123".to_string()]));
    assert_eq!(requests[1].icao24_filter, None);
}

#[tokio::test(start_paused = true)]
async fn test_callsign_filter_is_local_only() {
    let source = Arc::new(ReplaySource::from_snapshots(vec![vec![
        on_ground("abc123"),
        StateVector::new("def456", true).with_callsign("DAL88"),
    ]]));
    let mut service = service(Arc::clone(&source));
    service
        .start(
            "KSFO",
            FilterSpec::ByIdentifier(vec!["ABC123".to_string(), "UAL".to_string()]),
            INTERVAL,
        )
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    service.stop().await.unwrap();

    // A callsign candidate disables the upstream filter.
    assert_eq!(source.requests()[0].icao24_filter, None);
    let aircraft = service.current_aircraft();
    assert_eq!(aircraft.len(), 1);
    assert_eq!(aircraft[0].icao24, "abc123");
}

#[tokio::test(start_paused = true)]
async fn test_group_filter_uses_registry_types() {
    let mut registry = AircraftDatabase::new();
    registry.insert("abc123", Some("N12345"), Some("B738"));
    registry.insert("def456", Some("N54321"), Some("C172"));

    let mut groups = TypeGroupsDatabase::new();
    groups
        .create_group("passenger", &["B738".to_string(), "A320".to_string()])
        .unwrap();

    let source = Arc::new(ReplaySource::from_snapshots(vec![
        vec![on_ground("abc123"), on_ground("def456")],
        vec![airborne("abc123", 900.0), airborne("def456", 900.0)],
    ]));
    let mut service = service_with(Arc::clone(&source), registry, groups);
    service
        .start(
            "KSFO",
            FilterSpec::ByTypeGroup(vec!["Passenger".to_string()]),
            INTERVAL,
        )
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(15)).await;
    let last = service.stop().await.unwrap();

    assert_eq!(last.events.len(), 1);
    assert_eq!(last.events[0].icao24, "abc123");
    assert_eq!(source.requests()[0].icao24_filter, None);
}

#[tokio::test(start_paused = true)]
async fn test_restart_replaces_session() {
    let source = Arc::new(ReplaySource::new());
    let mut service = service(Arc::clone(&source));

    service
        .start("KSFO", FilterSpec::None, INTERVAL)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let elsewhere = AirportRef::new("KOAK", "Oakland", 37.7213, -122.2208).unwrap();
    service
        .start_at(elsewhere, FilterSpec::None, Duration::from_secs(30))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let status = service.status();
    assert!(status.running);
    assert_eq!(status.airport.as_deref(), Some("KOAK"));
    assert_eq!(status.interval_secs, Some(30));

    let last = service.stop().await.unwrap();
    assert_eq!(last.stats.polls, 1);
}
