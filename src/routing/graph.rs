// Routing graph - typed connections between decks
//
// Nodes are decks or devices, edges carry audio, MIDI, modulation or
// sidechain signal between named ports. Parallel edges between the same two
// nodes are allowed. Readers get `Arc<RoutingState>` snapshots; the graph
// copies on write so a snapshot never changes after it was returned.

use crate::ids::{EdgeId, NodeId, SubscriptionId};
use crate::notify::Publisher;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Routing errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoutingError {
    #[error("Cannot connect node {0} to itself")]
    SelfConnection(NodeId),
}

/// Kind of signal an edge carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Audio,
    Midi,
    Modulation,
    Sidechain,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionType::Audio => write!(f, "audio"),
            ConnectionType::Midi => write!(f, "midi"),
            ConnectionType::Modulation => write!(f, "modulation"),
            ConnectionType::Sidechain => write!(f, "sidechain"),
        }
    }
}

/// Position of a node in the routing overlay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A deck or device taking part in routing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingNode {
    pub id: NodeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl RoutingNode {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position: None,
        }
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }
}

/// Connection between two node ports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingEdge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub source_port: String,
    pub target_port: String,
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
}

/// Snapshot of the whole graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingState {
    pub nodes: BTreeMap<NodeId, RoutingNode>,
    pub edges: Vec<RoutingEdge>,
}

impl RoutingState {
    pub fn edge(&self, edge_id: &str) -> Option<&RoutingEdge> {
        self.edges.iter().find(|e| e.id.as_str() == edge_id)
    }

    /// Edges leaving a node
    pub fn edges_from(&self, node_id: &str) -> Vec<&RoutingEdge> {
        self.edges
            .iter()
            .filter(|e| e.from.as_str() == node_id)
            .collect()
    }

    /// Edges entering a node
    pub fn edges_to(&self, node_id: &str) -> Vec<&RoutingEdge> {
        self.edges.iter().filter(|e| e.to.as_str() == node_id).collect()
    }

    /// Edges touching a node on either side
    pub fn incident_edges(&self, node_id: &str) -> Vec<&RoutingEdge> {
        self.edges
            .iter()
            .filter(|e| e.from.as_str() == node_id || e.to.as_str() == node_id)
            .collect()
    }

    /// Whether a signal path leads from `from` to `to`
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &self.edges {
            outgoing
                .entry(edge.from.as_str())
                .or_default()
                .push(edge.to.as_str());
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut pending = vec![from];
        while let Some(current) = pending.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(targets) = outgoing.get(current) {
                pending.extend(targets.iter().copied());
            }
        }
        false
    }

    /// Whether connecting `from -> to` would close a feedback loop
    pub fn would_create_cycle(&self, from: &str, to: &str) -> bool {
        // Search from the target node to see if we can reach the source
        self.has_path(to, from)
    }

    /// Position of an edge in the edge list
    pub fn edge_index(&self, edge_id: &str) -> Option<usize> {
        self.edges.iter().position(|e| e.id.as_str() == edge_id)
    }
}

/// Notification delivered to routing subscribers
#[derive(Debug, Clone)]
pub struct RoutingChange {
    pub state: Arc<RoutingState>,
}

/// Owns the routing nodes and edges of a document
#[derive(Debug)]
pub struct RoutingGraph {
    state: Arc<RoutingState>,
    allow_self_connections: bool,
    subscribers: Publisher<(), RoutingChange>,
}

impl RoutingGraph {
    pub fn new(allow_self_connections: bool) -> Self {
        Self {
            state: Arc::new(RoutingState::default()),
            allow_self_connections,
            subscribers: Publisher::new(),
        }
    }

    /// Snapshot of every node and edge
    pub fn get_state(&self) -> Arc<RoutingState> {
        self.state.clone()
    }

    pub fn node(&self, node_id: &str) -> Option<&RoutingNode> {
        self.state.nodes.get(node_id)
    }

    pub fn edge(&self, edge_id: &str) -> Option<&RoutingEdge> {
        self.state.edge(edge_id)
    }

    /// Add or replace a node
    ///
    /// Returns the node it replaced.
    pub fn add_node(&mut self, node: RoutingNode) -> Option<RoutingNode> {
        log::debug!("Adding routing node {} ({})", node.id, node.name);
        let previous = self.state_mut().nodes.insert(node.id.clone(), node);
        self.notify();
        previous
    }

    /// Remove a node together with every edge touching it
    ///
    /// Returns the node and its edges, or `None` if it was not registered.
    pub fn remove_node(&mut self, node_id: &str) -> Option<(RoutingNode, Vec<RoutingEdge>)> {
        if !self.state.nodes.contains_key(node_id) {
            return None;
        }

        let state = self.state_mut();
        let node = state.nodes.remove(node_id)?;
        let (removed, kept): (Vec<RoutingEdge>, Vec<RoutingEdge>) = std::mem::take(&mut state.edges)
            .into_iter()
            .partition(|e| e.from.as_str() == node_id || e.to.as_str() == node_id);
        state.edges = kept;

        log::debug!(
            "Removed routing node {} and {} edge(s)",
            node_id,
            removed.len()
        );
        self.notify();
        Some((node, removed))
    }

    /// Move a node in the overlay; returns its previous position
    ///
    /// Returns `None` and changes nothing if the node is unknown.
    pub fn move_node(&mut self, node_id: &str, position: Option<Position>) -> Option<Option<Position>> {
        if !self.state.nodes.contains_key(node_id) {
            return None;
        }
        let node = self.state_mut().nodes.get_mut(node_id)?;
        let previous = std::mem::replace(&mut node.position, position);
        self.notify();
        Some(previous)
    }

    /// Create a new edge with a fresh id
    ///
    /// Nodes do not need to be registered first.
    ///
    /// # Errors
    /// Returns `SelfConnection` when `from == to` and self connections are
    /// not allowed.
    pub fn connect(
        &mut self,
        from: impl Into<NodeId>,
        source_port: impl Into<String>,
        to: impl Into<NodeId>,
        target_port: impl Into<String>,
        connection_type: ConnectionType,
    ) -> Result<RoutingEdge, RoutingError> {
        let from = from.into();
        let to = to.into();
        if from == to && !self.allow_self_connections {
            return Err(RoutingError::SelfConnection(from));
        }

        let edge = RoutingEdge {
            id: EdgeId::generate(),
            from,
            to,
            source_port: source_port.into(),
            target_port: target_port.into(),
            connection_type,
        };
        log::debug!(
            "Connected {}:{} -> {}:{} ({}) as {}",
            edge.from,
            edge.source_port,
            edge.to,
            edge.target_port,
            edge.connection_type,
            edge.id
        );
        self.state_mut().edges.push(edge.clone());
        self.notify();
        Ok(edge)
    }

    /// Insert an edge record verbatim at the end of the edge list
    ///
    /// Keeps its id. Returns false if an edge with that id already exists.
    pub fn insert_edge(&mut self, edge: RoutingEdge) -> bool {
        let index = self.state.edges.len();
        self.insert_edge_at(edge, index)
    }

    /// Insert an edge record verbatim at `index` (clamped to the list length)
    ///
    /// Keeps its id. Returns false if an edge with that id already exists.
    pub fn insert_edge_at(&mut self, edge: RoutingEdge, index: usize) -> bool {
        if self.state.edge(&edge.id).is_some() {
            return false;
        }
        log::debug!("Restored edge {} at {}", edge.id, index);
        let edges = &mut self.state_mut().edges;
        let index = index.min(edges.len());
        edges.insert(index, edge);
        self.notify();
        true
    }

    /// Put back a removed node and its edges at their old positions
    ///
    /// `edges` holds `(index, edge)` pairs as they were before removal.
    /// Notifies once.
    pub(crate) fn restore_node(&mut self, node: RoutingNode, edges: &[(usize, RoutingEdge)]) {
        let mut edges = edges.to_vec();
        edges.sort_by_key(|(index, _)| *index);

        let state = self.state_mut();
        state.nodes.insert(node.id.clone(), node);
        for (index, edge) in edges {
            if state.edge(&edge.id).is_none() {
                let index = index.min(state.edges.len());
                state.edges.insert(index, edge);
            }
        }
        self.notify();
    }

    /// Remove an edge; no-op if it does not exist
    pub fn disconnect(&mut self, edge_id: &str) -> Option<RoutingEdge> {
        let index = self
            .state
            .edges
            .iter()
            .position(|e| e.id.as_str() == edge_id)?;
        let edge = self.state_mut().edges.remove(index);

        log::debug!("Disconnected edge {}", edge_id);
        self.notify();
        Some(edge)
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&RoutingChange) + 'static,
    {
        self.subscribers.subscribe((), callback)
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(subscription)
    }

    fn state_mut(&mut self) -> &mut RoutingState {
        Arc::make_mut(&mut self.state)
    }

    fn notify(&mut self) {
        let change = RoutingChange {
            state: self.state.clone(),
        };
        self.subscribers.notify(&(), &change);
    }
}

impl Default for RoutingGraph {
    fn default() -> Self {
        Self::new(false)
    }
}
