// Routing commands
//
// Every command stores the full edge and node records it removes or creates,
// so undo and redo put back the same identities rather than minting new ids.

use crate::command::state::DocumentState;
use crate::command::trait_def::{CommandError, CommandResult, UndoableCommand};
use crate::ids::{EdgeId, NodeId};
use crate::routing::graph::{ConnectionType, RoutingEdge, RoutingNode};

/// Command to connect two node ports
pub struct ConnectCommand {
    from: NodeId,
    source_port: String,
    to: NodeId,
    target_port: String,
    connection_type: ConnectionType,
    edge: Option<RoutingEdge>,
}

impl ConnectCommand {
    pub fn new(
        from: impl Into<NodeId>,
        source_port: impl Into<String>,
        to: impl Into<NodeId>,
        target_port: impl Into<String>,
        connection_type: ConnectionType,
    ) -> Self {
        Self {
            from: from.into(),
            source_port: source_port.into(),
            to: to.into(),
            target_port: target_port.into(),
            connection_type,
            edge: None,
        }
    }

    /// Wrap an edge the caller already created with `RoutingGraph::connect`
    ///
    /// Meant for `UndoStack::push`.
    pub fn already_connected(edge: RoutingEdge) -> Self {
        Self {
            from: edge.from.clone(),
            source_port: edge.source_port.clone(),
            to: edge.to.clone(),
            target_port: edge.target_port.clone(),
            connection_type: edge.connection_type,
            edge: Some(edge),
        }
    }

    /// The created edge, once executed
    pub fn edge(&self) -> Option<&RoutingEdge> {
        self.edge.as_ref()
    }
}

impl UndoableCommand for ConnectCommand {
    fn execute(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        let edge = state
            .routing
            .connect(
                self.from.clone(),
                self.source_port.clone(),
                self.to.clone(),
                self.target_port.clone(),
                self.connection_type,
            )
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
        self.edge = Some(edge);
        Ok(())
    }

    fn undo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        let edge = self
            .edge
            .as_ref()
            .ok_or_else(|| CommandError::UndoFailed("No edge stored".into()))?;
        state.routing.disconnect(&edge.id);
        Ok(())
    }

    fn redo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        let edge = self
            .edge
            .clone()
            .ok_or_else(|| CommandError::RedoFailed("No edge stored".into()))?;
        state.routing.insert_edge(edge);
        Ok(())
    }

    fn command_type(&self) -> &str {
        "connect"
    }

    fn description(&self) -> String {
        format!(
            "Connect {}:{} to {}:{} ({})",
            self.from, self.source_port, self.to, self.target_port, self.connection_type
        )
    }
}

/// Command to remove an edge
///
/// Undo puts the edge back at its old position in the edge list.
pub struct DisconnectCommand {
    edge_id: EdgeId,
    removed: Option<(usize, RoutingEdge)>,
}

impl DisconnectCommand {
    pub fn new(edge_id: impl Into<EdgeId>) -> Self {
        Self {
            edge_id: edge_id.into(),
            removed: None,
        }
    }
}

impl UndoableCommand for DisconnectCommand {
    fn execute(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        let index = state.routing.get_state().edge_index(&self.edge_id);
        self.removed = index.zip(state.routing.disconnect(&self.edge_id));
        Ok(())
    }

    fn undo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        if let Some((index, edge)) = &self.removed {
            state.routing.insert_edge_at(edge.clone(), *index);
        }
        Ok(())
    }

    fn command_type(&self) -> &str {
        "disconnect"
    }

    fn description(&self) -> String {
        format!("Disconnect {}", self.edge_id)
    }
}

/// Command to register (or replace) a routing node
pub struct AddNodeCommand {
    node: RoutingNode,
    replaced: Option<RoutingNode>,
}

impl AddNodeCommand {
    pub fn new(node: RoutingNode) -> Self {
        Self {
            node,
            replaced: None,
        }
    }
}

impl UndoableCommand for AddNodeCommand {
    fn execute(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        self.replaced = state.routing.add_node(self.node.clone());
        Ok(())
    }

    fn undo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        match &self.replaced {
            Some(previous) => {
                state.routing.add_node(previous.clone());
            }
            None => {
                state.routing.remove_node(&self.node.id);
            }
        }
        Ok(())
    }

    fn command_type(&self) -> &str {
        "add-node"
    }

    fn description(&self) -> String {
        format!("Add {}", self.node.name)
    }
}

/// Command to remove a node and every edge touching it
///
/// Undo restores the node and puts each edge back at its old position.
pub struct RemoveNodeCommand {
    node_id: NodeId,
    removed: Option<(RoutingNode, Vec<(usize, RoutingEdge)>)>,
}

impl RemoveNodeCommand {
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            removed: None,
        }
    }
}

impl UndoableCommand for RemoveNodeCommand {
    fn execute(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        let snapshot = state.routing.get_state();
        let indexed: Vec<(usize, RoutingEdge)> = snapshot
            .edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.from == self.node_id || e.to == self.node_id)
            .map(|(index, e)| (index, e.clone()))
            .collect();

        self.removed = state
            .routing
            .remove_node(&self.node_id)
            .map(|(node, _)| (node, indexed));
        Ok(())
    }

    fn undo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        if let Some((node, edges)) = &self.removed {
            state.routing.restore_node(node.clone(), edges);
        }
        Ok(())
    }

    fn command_type(&self) -> &str {
        "remove-node"
    }

    fn description(&self) -> String {
        format!("Remove {}", self.node_id)
    }
}
