// EventStore - single source of truth for note and automation data
//
// Every mutating call applies its change completely, then notifies the
// subscribers of the touched stream, then returns. Calls that target a
// missing stream or missing events change nothing and notify nobody.

use crate::config::EventOrdering;
use crate::event::stream::{EventStream, StreamOptions};
use crate::event::types::{Event, EventPatch};
use crate::ids::{EventId, StreamId, SubscriptionId};
use crate::notify::Publisher;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Event store errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventStoreError {
    #[error("Stream already exists: {0}")]
    StreamExists(StreamId),
}

/// What happened to a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Replaced,
    EventsAdded,
    EventsRemoved,
    EventUpdated,
    Transformed,
    Removed,
}

/// Notification delivered to stream subscribers
#[derive(Debug, Clone)]
pub struct StreamChange {
    pub stream_id: StreamId,
    pub kind: ChangeKind,
    /// Snapshot after the change; `None` once the stream was removed
    pub stream: Option<Arc<EventStream>>,
}

/// Owns every event stream of a document
#[derive(Debug)]
pub struct EventStore {
    streams: HashMap<StreamId, Arc<EventStream>>,
    /// Creation order, for stable iteration
    order: Vec<StreamId>,
    ordering: EventOrdering,
    subscribers: Publisher<StreamId, StreamChange>,
}

impl EventStore {
    pub fn new(ordering: EventOrdering) -> Self {
        Self {
            streams: HashMap::new(),
            order: Vec::new(),
            ordering,
            subscribers: Publisher::new(),
        }
    }

    pub fn ordering(&self) -> EventOrdering {
        self.ordering
    }

    /// Create a stream
    ///
    /// Generates an id when none is given.
    ///
    /// # Errors
    /// Returns `StreamExists` if an explicit id is already taken; use
    /// `set_stream` to replace the events of an existing stream.
    pub fn create_stream(
        &mut self,
        options: StreamOptions,
    ) -> Result<Arc<EventStream>, EventStoreError> {
        let id = options.id.unwrap_or_else(StreamId::generate);
        if self.streams.contains_key(&id) {
            return Err(EventStoreError::StreamExists(id));
        }

        let stream = EventStream::new(id, options.name, options.events);
        let index = self.order.len();
        Ok(self.insert_stream(stream, index))
    }

    /// Re-insert a stream at a position in the creation order
    ///
    /// Used to undo a stream deletion. Replaces any stream with the same id.
    pub(crate) fn insert_stream(&mut self, mut stream: EventStream, index: usize) -> Arc<EventStream> {
        warn_duplicate_ids(&stream.id, stream.events());
        stream.normalize(self.ordering);

        let id = stream.id.clone();
        let snapshot = Arc::new(stream);
        if self.streams.insert(id.clone(), snapshot.clone()).is_none() {
            self.order.insert(index.min(self.order.len()), id.clone());
        }

        log::debug!("Created stream {} ({} events)", id, snapshot.len());
        self.notify(&id, ChangeKind::Created);
        snapshot
    }

    /// Snapshot of a stream
    pub fn get_stream(&self, stream_id: &str) -> Option<Arc<EventStream>> {
        self.streams.get(stream_id).cloned()
    }

    pub fn contains_stream(&self, stream_id: &str) -> bool {
        self.streams.contains_key(stream_id)
    }

    /// Stream ids in creation order
    pub fn stream_ids(&self) -> Vec<StreamId> {
        self.order.clone()
    }

    /// Position of a stream in the creation order
    pub fn stream_index(&self, stream_id: &str) -> Option<usize> {
        self.order.iter().position(|id| id.as_str() == stream_id)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Replace every event of a stream
    ///
    /// Returns false if the stream does not exist.
    pub fn set_stream(&mut self, stream_id: &str, events: Vec<Event>) -> bool {
        let ordering = self.ordering;
        let Some(stream) = self.stream_mut(stream_id) else {
            return false;
        };
        warn_duplicate_ids(&stream.id, &events);
        stream.replace_events(events);
        stream.normalize(ordering);

        log::debug!("Replaced events of stream {}", stream_id);
        self.notify_str(stream_id, ChangeKind::Replaced);
        true
    }

    /// Append events to a stream
    ///
    /// Ids are not de-duplicated; callers keep them unique. Returns false if
    /// the stream does not exist. An empty list changes nothing and notifies
    /// nobody.
    pub fn add_events(&mut self, stream_id: &str, events: Vec<Event>) -> bool {
        if events.is_empty() {
            return self.streams.contains_key(stream_id);
        }
        let ordering = self.ordering;
        let Some(stream) = self.stream_mut(stream_id) else {
            return false;
        };

        let count = events.len();
        for event in events {
            if stream.contains(&event.id) {
                log::warn!(
                    "Stream {} already contains event {}; adding a duplicate",
                    stream_id,
                    event.id
                );
            }
            stream.insert_event(event, ordering);
        }

        log::debug!("Added {} event(s) to stream {}", count, stream_id);
        self.notify_str(stream_id, ChangeKind::EventsAdded);
        true
    }

    /// Remove events by id
    ///
    /// Absent ids are ignored. Returns the removed events; nothing is
    /// notified when none matched.
    pub fn remove_events(&mut self, stream_id: &str, event_ids: &[EventId]) -> Vec<Event> {
        let wanted: HashSet<&str> = event_ids.iter().map(|id| id.as_str()).collect();
        let matches = self
            .streams
            .get(stream_id)
            .is_some_and(|s| s.events().iter().any(|e| wanted.contains(e.id.as_str())));
        if !matches {
            return Vec::new();
        }

        let Some(stream) = self.stream_mut(stream_id) else {
            return Vec::new();
        };
        let (removed, kept): (Vec<Event>, Vec<Event>) = std::mem::take(stream.events_mut())
            .into_iter()
            .partition(|e| wanted.contains(e.id.as_str()));
        stream.replace_events(kept);

        log::debug!("Removed {} event(s) from stream {}", removed.len(), stream_id);
        self.notify_str(stream_id, ChangeKind::EventsRemoved);
        removed
    }

    /// Merge-patch one event
    ///
    /// Returns the event as it was before the patch, or `None` (and changes
    /// nothing) if the stream or event does not exist.
    pub fn update_event(
        &mut self,
        stream_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Option<Event> {
        let index = self
            .streams
            .get(stream_id)?
            .events()
            .iter()
            .position(|e| e.id.as_str() == event_id)?;

        let ordering = self.ordering;
        let stream = self.stream_mut(stream_id)?;
        let event = &mut stream.events_mut()[index];
        let previous = event.clone();
        patch.apply(event);
        if event.start != previous.start {
            stream.normalize(ordering);
        }

        log::debug!("Updated event {} in stream {}", event_id, stream_id);
        self.notify_str(stream_id, ChangeKind::EventUpdated);
        Some(previous)
    }

    /// Apply an arbitrary transform to the whole event list
    ///
    /// Notifies once no matter how many events changed. Returns false if the
    /// stream does not exist.
    pub fn update_stream<F>(&mut self, stream_id: &str, transform: F) -> bool
    where
        F: FnOnce(&[Event]) -> Vec<Event>,
    {
        let ordering = self.ordering;
        let Some(stream) = self.stream_mut(stream_id) else {
            return false;
        };
        let events = transform(stream.events());
        warn_duplicate_ids(&stream.id, &events);
        stream.replace_events(events);
        stream.normalize(ordering);

        log::debug!("Transformed stream {}", stream_id);
        self.notify_str(stream_id, ChangeKind::Transformed);
        true
    }

    /// Delete a stream
    ///
    /// Subscriptions survive, so a stream re-created with the same id keeps
    /// notifying them.
    pub fn remove_stream(&mut self, stream_id: &str) -> Option<Arc<EventStream>> {
        let removed = self.streams.remove(stream_id)?;
        self.order.retain(|id| id.as_str() != stream_id);

        log::debug!("Removed stream {}", stream_id);
        self.notify(&removed.id, ChangeKind::Removed);
        Some(removed)
    }

    /// Subscribe to changes of one stream
    ///
    /// The stream does not need to exist yet.
    pub fn subscribe<F>(&mut self, stream_id: impl Into<StreamId>, callback: F) -> SubscriptionId
    where
        F: FnMut(&StreamChange) + 'static,
    {
        self.subscribers.subscribe(stream_id.into(), callback)
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(subscription)
    }

    pub fn subscriber_count(&self, stream_id: impl Into<StreamId>) -> usize {
        self.subscribers.subscriber_count(&stream_id.into())
    }

    /// Writable stream, copied first if a snapshot of it is still shared
    fn stream_mut(&mut self, stream_id: &str) -> Option<&mut EventStream> {
        self.streams.get_mut(stream_id).map(Arc::make_mut)
    }

    fn notify_str(&mut self, stream_id: &str, kind: ChangeKind) {
        self.notify(&StreamId::from(stream_id), kind);
    }

    fn notify(&mut self, stream_id: &StreamId, kind: ChangeKind) {
        let change = StreamChange {
            stream_id: stream_id.clone(),
            kind,
            stream: self.streams.get(stream_id).cloned(),
        };
        self.subscribers.notify(stream_id, &change);
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(EventOrdering::default())
    }
}

fn warn_duplicate_ids(stream_id: &StreamId, events: &[Event]) {
    let mut seen = HashSet::new();
    for event in events {
        if !seen.insert(event.id.as_str()) {
            log::warn!("Stream {} holds duplicate event id {}", stream_id, event.id);
        }
    }
}
