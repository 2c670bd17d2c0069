// EditorContext - everything one open document's editors share
//
// Built once per document and handed to every adapter (piano roll, arranger,
// routing overlay, tracker) instead of reaching for process-wide singletons.
// Several contexts can live side by side.

use crate::command::{
    CommandDescriptor, CommandInfo, CommandResult, DocumentState, RecentItems, UndoStack,
    UndoableCommand,
};
use crate::config::StoreConfig;
use crate::event::EventStore;
use crate::routing::{ConnectCommand, ConnectionType, RoutingEdge, RoutingError, RoutingGraph};
use crate::selection::SelectionStore;
use crate::ids::NodeId;

/// Shared stores and history of one document
#[derive(Debug)]
pub struct EditorContext {
    config: StoreConfig,
    state: DocumentState,
    history: UndoStack,
    recent: RecentItems<String>,
}

impl EditorContext {
    pub fn new(config: StoreConfig) -> Self {
        log::debug!(
            "Creating editor context (undo capacity {}, ordering {:?})",
            config.undo_capacity,
            config.event_ordering
        );
        Self {
            state: DocumentState::new(&config),
            history: UndoStack::with_capacity(config.undo_capacity),
            recent: RecentItems::with_capacity(config.recent_capacity),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn events(&self) -> &EventStore {
        &self.state.events
    }

    pub fn events_mut(&mut self) -> &mut EventStore {
        &mut self.state.events
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.state.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionStore {
        &mut self.state.selection
    }

    pub fn routing(&self) -> &RoutingGraph {
        &self.state.routing
    }

    pub fn routing_mut(&mut self) -> &mut RoutingGraph {
        &mut self.state.routing
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut DocumentState {
        &mut self.state
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    /// Execute a command and record it
    pub fn execute(&mut self, command: Box<dyn UndoableCommand>) -> CommandResult<()> {
        let command_type = command.command_type().to_string();
        self.history.execute(command, &mut self.state)?;
        self.recent.touch(command_type);
        Ok(())
    }

    /// Run a closure-described edit now and record it; returns its result
    pub fn execute_with_undo<R, E, U, D>(&mut self, descriptor: CommandDescriptor<E, U, D>) -> R
    where
        R: Clone + Send + 'static,
        E: FnOnce(&mut DocumentState) -> R,
        U: FnMut(&mut DocumentState, &R) + Send + 'static,
        D: FnMut(&mut DocumentState, &R) + Send + 'static,
    {
        self.recent.touch(descriptor.command_type.clone());
        self.history.execute_with_undo(&mut self.state, descriptor)
    }

    /// Record a command whose forward action was already performed
    pub fn push(&mut self, command: Box<dyn UndoableCommand>) {
        self.recent.touch(command.command_type().to_string());
        self.history.push(command);
    }

    /// Connect two ports and record the connection in the history
    ///
    /// The graph mutation happens first and the command is built around the
    /// resulting edge, so undo/redo address that exact edge.
    pub fn connect_with_undo(
        &mut self,
        from: impl Into<NodeId>,
        source_port: impl Into<String>,
        to: impl Into<NodeId>,
        target_port: impl Into<String>,
        connection_type: ConnectionType,
    ) -> Result<RoutingEdge, RoutingError> {
        let edge = self
            .state
            .routing
            .connect(from, source_port, to, target_port, connection_type)?;
        self.push(Box::new(ConnectCommand::already_connected(edge.clone())));
        Ok(edge)
    }

    pub fn undo_last_command(&mut self) -> CommandResult<Option<CommandInfo>> {
        self.history.undo_last_command(&mut self.state)
    }

    pub fn redo_last_command(&mut self) -> CommandResult<Option<CommandInfo>> {
        self.history.redo_last_command(&mut self.state)
    }

    pub fn undo_stack(&self) -> Vec<CommandInfo> {
        self.history.undo_stack()
    }

    pub fn redo_stack(&self) -> Vec<CommandInfo> {
        self.history.redo_stack()
    }

    pub fn all_commands(&self) -> Vec<CommandInfo> {
        self.history.all_commands()
    }

    pub fn clear_commands(&mut self) {
        self.history.clear_commands();
    }

    /// Command types used most recently, newest first
    pub fn recent_commands(&self) -> Vec<String> {
        self.recent.iter().cloned().collect()
    }
}

impl Default for EditorContext {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}
