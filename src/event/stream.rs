// EventStream - named collection of events, typically one per track or part

use crate::config::EventOrdering;
use crate::event::types::{Event, Tick};
use crate::ids::{EventId, StreamId};
use serde::{Deserialize, Serialize};

/// A stream of events
///
/// Streams handed out by the store are immutable snapshots; the store
/// copies on write so a snapshot never changes after it was returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStream {
    pub id: StreamId,

    pub name: String,

    events: Vec<Event>,
}

impl EventStream {
    pub fn new(id: StreamId, name: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            id,
            name: name.into(),
            events,
        }
    }

    /// All events, in the order the store keeps them
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get an event by ID
    pub fn event(&self, event_id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id.as_str() == event_id)
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.event(event_id).is_some()
    }

    pub fn event_ids(&self) -> Vec<EventId> {
        self.events.iter().map(|e| e.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events overlapping the half-open range `[start, end)`
    pub fn events_in_range(&self, start: Tick, end: Tick) -> Vec<&Event> {
        self.events.iter().filter(|e| e.overlaps(start, end)).collect()
    }

    /// Tick at which the last event ends (0 for an empty stream)
    pub fn end_tick(&self) -> Tick {
        self.events.iter().map(Event::end).max().unwrap_or(0)
    }

    pub(crate) fn events_mut(&mut self) -> &mut Vec<Event> {
        &mut self.events
    }

    pub(crate) fn replace_events(&mut self, events: Vec<Event>) {
        self.events = events;
    }

    /// Insert one event according to the ordering policy
    pub(crate) fn insert_event(&mut self, event: Event, ordering: EventOrdering) {
        match ordering {
            EventOrdering::SortedByStart => {
                // After any events with the same start, so equal starts keep call order
                let insert_pos = self.events.partition_point(|e| e.start <= event.start);
                self.events.insert(insert_pos, event);
            }
            EventOrdering::Insertion => self.events.push(event),
        }
    }

    /// Re-establish the ordering policy after arbitrary edits
    pub(crate) fn normalize(&mut self, ordering: EventOrdering) {
        if ordering == EventOrdering::SortedByStart {
            // Stable, so events with equal starts keep their relative order
            self.events.sort_by_key(|e| e.start);
        }
    }
}

/// Options for `EventStore::create_stream`
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    /// Explicit id; one is generated when absent
    pub id: Option<StreamId>,
    pub name: String,
    pub events: Vec<Event>,
}

impl StreamOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            events: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<StreamId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }
}
