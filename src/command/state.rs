// DocumentState - the stores one document's commands operate on
//
// Commands get `&mut DocumentState`, so an edit touching events, selection
// and routing together is still a single atomic history entry.

use crate::config::StoreConfig;
use crate::event::EventStore;
use crate::routing::RoutingGraph;
use crate::selection::SelectionStore;

/// Mutable state of one open document
#[derive(Debug)]
pub struct DocumentState {
    /// Note and automation streams
    pub events: EventStore,

    /// Per-stream selection shared by every view
    pub selection: SelectionStore,

    /// Deck connections
    pub routing: RoutingGraph,

    /// Undoable deletions also drop the deleted ids from the selection
    pub prune_selection_on_delete: bool,
}

impl DocumentState {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            events: EventStore::new(config.event_ordering),
            selection: SelectionStore::new(),
            routing: RoutingGraph::new(config.allow_self_connections),
            prune_selection_on_delete: config.prune_selection_on_delete,
        }
    }
}

impl Default for DocumentState {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}
