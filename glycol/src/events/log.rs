//! Session event log.

use std::sync::Arc;

use super::{Event, EventType};

/// Append-only list of the events detected in the current session.
///
/// Only [`EventLog::clear`] and [`EventLog::take`] remove entries, both on
/// explicit request. The list is held behind an `Arc` so published
/// snapshots share it; it is copied only when events are appended while a
/// snapshot still holds the previous list.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends events in order.
    pub fn append(&mut self, events: impl IntoIterator<Item = Event>) {
        let mut events = events.into_iter().peekable();
        if events.peek().is_some() {
            Arc::make_mut(&mut self.events).extend(events);
        }
    }

    /// Copy of all events, oldest first.
    pub fn events(&self) -> Vec<Event> {
        self.events.as_ref().clone()
    }

    /// Shared handle to the current list. Later appends do not change it.
    pub fn shared(&self) -> Arc<Vec<Event>> {
        Arc::clone(&self.events)
    }

    /// Borrowed view of all events.
    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Removes every event.
    pub fn clear(&mut self) {
        self.events = Arc::default();
    }

    /// Removes and returns every event (for export).
    pub fn take(&mut self) -> Vec<Event> {
        Arc::try_unwrap(std::mem::take(&mut self.events)).unwrap_or_else(|shared| (*shared).clone())
    }

    /// Number of events of one kind.
    pub fn count(&self, event_type: EventType) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(event_type: EventType, icao24: &str) -> Event {
        Event {
            event_type,
            icao24: icao24.to_string(),
            callsign: None,
            altitude: None,
            timestamp: Utc::now(),
            airport: "KSFO".to_string(),
            latitude: None,
            longitude: None,
            velocity: None,
        }
    }

    #[test]
    fn test_append_preserves_order() {
        let mut log = EventLog::new();
        log.append(vec![event(EventType::Takeoff, "aaa111")]);
        log.append(vec![
            event(EventType::Landing, "bbb222"),
            event(EventType::Takeoff, "ccc333"),
        ]);

        let icaos: Vec<_> = log.events().into_iter().map(|e| e.icao24).collect();
        assert_eq!(icaos, vec!["aaa111", "bbb222", "ccc333"]);
        assert_eq!(log.count(EventType::Takeoff), 2);
        assert_eq!(log.count(EventType::Landing), 1);
    }

    #[test]
    fn test_events_is_a_copy() {
        let mut log = EventLog::new();
        log.append(vec![event(EventType::Takeoff, "aaa111")]);
        let copy = log.events();
        log.clear();
        assert_eq!(copy.len(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn test_shared_list_is_reused_until_append() {
        let mut log = EventLog::new();
        log.append(vec![event(EventType::Takeoff, "aaa111")]);

        let first = log.shared();
        log.append(Vec::new());
        assert!(Arc::ptr_eq(&first, &log.shared()));

        log.append(vec![event(EventType::Landing, "aaa111")]);
        assert_eq!(first.len(), 1);
        assert_eq!(log.shared().len(), 2);
        assert!(!Arc::ptr_eq(&first, &log.shared()));

        let held = log.shared();
        log.clear();
        assert_eq!(held.len(), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn test_take_drains() {
        let mut log = EventLog::new();
        log.append(vec![event(EventType::Landing, "aaa111")]);
        let taken = log.take();
        assert_eq!(taken.len(), 1);
        assert_eq!(log.len(), 0);
    }
}
