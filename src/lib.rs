// CardPlay shared data layer - Library exports for editors, tests and benchmarks

pub mod command;
pub mod config;
pub mod context;
pub mod event;
pub mod ids;
pub mod notify;
pub mod routing;
pub mod selection;

// Re-export commonly used types for convenience
pub use command::{CommandDescriptor, CommandError, CommandInfo, UndoStack, UndoableCommand};
pub use config::{EventOrdering, StoreConfig};
pub use context::EditorContext;
pub use event::{Event, EventPatch, EventPayload, EventStore, EventStream, StreamOptions};
pub use ids::{EdgeId, EventId, NodeId, StreamId, SubscriptionId};
pub use routing::{ConnectionType, RoutingEdge, RoutingGraph, RoutingNode, RoutingState};
pub use selection::{Selection, SelectionStore};
