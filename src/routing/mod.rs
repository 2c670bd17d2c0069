// Routing graph - audio/MIDI/modulation connections between decks

pub mod commands;
pub mod graph;

pub use commands::{AddNodeCommand, ConnectCommand, DisconnectCommand, RemoveNodeCommand};
pub use graph::{
    ConnectionType, Position, RoutingChange, RoutingEdge, RoutingError, RoutingGraph, RoutingNode,
    RoutingState,
};
