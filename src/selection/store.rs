// SelectionStore - per-stream selected event ids, shared by every editor view
//
// Keyed by the same stream ids as the event store but independent of it:
// removing events does not touch the selection. Callers that want stale ids
// gone call `prune`, or go through the undoable delete commands.

use crate::event::EventStream;
use crate::ids::{EventId, StreamId, SubscriptionId};
use crate::notify::Publisher;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Selected event ids of one stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    event_ids: BTreeSet<EventId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = EventId>,
    {
        Self {
            event_ids: ids.into_iter().collect(),
        }
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.event_ids.contains(event_id)
    }

    pub fn len(&self) -> usize {
        self.event_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventId> {
        self.event_ids.iter()
    }

    /// Selected ids in sorted order
    pub fn ids(&self) -> Vec<EventId> {
        self.event_ids.iter().cloned().collect()
    }
}

/// Notification delivered to selection subscribers
#[derive(Debug, Clone)]
pub struct SelectionChange {
    pub stream_id: StreamId,
    pub selection: Selection,
}

/// Owns the selection of every stream
#[derive(Debug, Default)]
pub struct SelectionStore {
    selections: HashMap<StreamId, Selection>,
    subscribers: Publisher<StreamId, SelectionChange>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current selection, empty if nothing was ever selected
    pub fn get_selection(&self, stream_id: &str) -> Selection {
        self.selections.get(stream_id).cloned().unwrap_or_default()
    }

    pub fn is_selected(&self, stream_id: &str, event_id: &str) -> bool {
        self.selections
            .get(stream_id)
            .is_some_and(|s| s.contains(event_id))
    }

    /// Add ids to the selection
    pub fn select<I>(&mut self, stream_id: &str, ids: I) -> bool
    where
        I: IntoIterator<Item = EventId>,
    {
        let entry = self.entry(stream_id);
        let before = entry.len();
        entry.event_ids.extend(ids);
        let changed = entry.len() != before;
        self.commit(stream_id, changed)
    }

    /// Replace the selection; an empty list clears it
    pub fn set_selection<I>(&mut self, stream_id: &str, ids: I) -> bool
    where
        I: IntoIterator<Item = EventId>,
    {
        let next = Selection::from_ids(ids);
        let entry = self.entry(stream_id);
        let changed = *entry != next;
        *entry = next;
        self.commit(stream_id, changed)
    }

    /// Remove ids from the selection
    pub fn deselect(&mut self, stream_id: &str, ids: &[EventId]) -> bool {
        let Some(selection) = self.selections.get_mut(stream_id) else {
            return false;
        };
        let before = selection.len();
        for id in ids {
            selection.event_ids.remove(id);
        }
        let changed = selection.len() != before;
        self.commit(stream_id, changed)
    }

    pub fn clear(&mut self, stream_id: &str) -> bool {
        self.set_selection(stream_id, std::iter::empty())
    }

    /// Drop ids that no longer exist in `stream`
    ///
    /// Returns the ids that were removed.
    pub fn prune(&mut self, stream: &EventStream) -> Vec<EventId> {
        let Some(selection) = self.selections.get_mut(stream.id.as_str()) else {
            return Vec::new();
        };
        let stale: Vec<EventId> = selection
            .event_ids
            .iter()
            .filter(|id| !stream.contains(id))
            .cloned()
            .collect();
        for id in &stale {
            selection.event_ids.remove(id);
        }

        if !stale.is_empty() {
            log::debug!("Pruned {} stale id(s) from selection of {}", stale.len(), stream.id);
        }
        self.commit(&stream.id, !stale.is_empty());
        stale
    }

    /// Forget the selection of a deleted stream
    ///
    /// Returns the selection it held.
    pub fn remove_stream(&mut self, stream_id: &str) -> Selection {
        let removed = self.selections.remove(stream_id).unwrap_or_default();
        if !removed.is_empty() {
            self.notify(stream_id);
        }
        removed
    }

    pub fn subscribe<F>(&mut self, stream_id: impl Into<StreamId>, callback: F) -> SubscriptionId
    where
        F: FnMut(&SelectionChange) + 'static,
    {
        self.subscribers.subscribe(stream_id.into(), callback)
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(subscription)
    }

    fn entry(&mut self, stream_id: &str) -> &mut Selection {
        self.selections.entry(StreamId::from(stream_id)).or_default()
    }

    fn commit(&mut self, stream_id: &str, changed: bool) -> bool {
        if changed {
            self.notify(stream_id);
        }
        changed
    }

    fn notify(&mut self, stream_id: &str) {
        let key = StreamId::from(stream_id);
        let change = SelectionChange {
            selection: self.get_selection(stream_id),
            stream_id: key.clone(),
        };
        self.subscribers.notify(&key, &change);
    }
}
