// UndoStack - Manages undo/redo history

use crate::command::state::DocumentState;
use crate::command::trait_def::{CommandResult, UndoableCommand};
use crate::config::DEFAULT_UNDO_CAPACITY;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Read-only view of a history entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandInfo {
    pub command_type: String,
    pub description: String,
    /// When the command entered the history
    pub committed_at: DateTime<Utc>,
}

struct HistoryEntry {
    command: Box<dyn UndoableCommand>,
    info: CommandInfo,
}

impl HistoryEntry {
    fn new(command: Box<dyn UndoableCommand>) -> Self {
        let info = CommandInfo {
            command_type: command.command_type().to_string(),
            description: command.description(),
            committed_at: Utc::now(),
        };
        Self { command, info }
    }
}

/// Bounded undo/redo history
///
/// The UndoStack maintains two stacks:
/// - Undo stack: Commands that have been applied and can be undone
/// - Redo stack: Commands that have been undone and can be redone
///
/// When a new command enters the history:
/// 1. It is pushed onto the undo stack
/// 2. The redo stack is cleared (since we're on a new timeline)
/// 3. The oldest entry is dropped if the capacity is exceeded
///
/// Eviction only bounds memory; an evicted command can no longer be undone.
pub struct UndoStack {
    /// Commands that can be undone (most recent at the back)
    undo_stack: VecDeque<HistoryEntry>,

    /// Commands that can be redone (most recent at the back)
    redo_stack: VecDeque<HistoryEntry>,

    /// Maximum number of commands to keep in history
    capacity: usize,
}

impl UndoStack {
    /// Create an UndoStack with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_UNDO_CAPACITY)
    }

    /// Create an UndoStack with a custom history limit
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(capacity),
            redo_stack: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Execute a command and add it to the undo stack
    ///
    /// # Errors
    /// Returns an error if the command execution fails; nothing is recorded.
    pub fn execute(
        &mut self,
        mut command: Box<dyn UndoableCommand>,
        state: &mut DocumentState,
    ) -> CommandResult<()> {
        command.execute(state)?;
        self.push(command);
        Ok(())
    }

    /// Record a command whose forward action the caller already performed
    pub fn push(&mut self, command: Box<dyn UndoableCommand>) {
        let entry = HistoryEntry::new(command);
        log::debug!(
            "History push: {} ({})",
            entry.info.description,
            entry.info.command_type
        );
        self.undo_stack.push_back(entry);

        // Clear redo stack (we're on a new timeline now)
        self.redo_stack.clear();

        self.trim();
    }

    /// Undo the most recent command
    ///
    /// Returns the undone command's info, or `None` if there is nothing to
    /// undo. A command whose undo fails stays on the undo stack.
    pub fn undo_last_command(
        &mut self,
        state: &mut DocumentState,
    ) -> CommandResult<Option<CommandInfo>> {
        let Some(mut entry) = self.undo_stack.pop_back() else {
            return Ok(None);
        };

        if let Err(e) = entry.command.undo(state) {
            log::warn!("Undo of '{}' failed: {}", entry.info.description, e);
            self.undo_stack.push_back(entry);
            return Err(e);
        }

        log::debug!("Undid: {}", entry.info.description);
        let info = entry.info.clone();
        self.redo_stack.push_back(entry);
        Ok(Some(info))
    }

    /// Redo the most recently undone command
    ///
    /// Returns the redone command's info, or `None` if there is nothing to
    /// redo. A command whose redo fails stays on the redo stack.
    pub fn redo_last_command(
        &mut self,
        state: &mut DocumentState,
    ) -> CommandResult<Option<CommandInfo>> {
        let Some(mut entry) = self.redo_stack.pop_back() else {
            return Ok(None);
        };

        if let Err(e) = entry.command.redo(state) {
            log::warn!("Redo of '{}' failed: {}", entry.info.description, e);
            self.redo_stack.push_back(entry);
            return Err(e);
        }

        log::debug!("Redid: {}", entry.info.description);
        let info = entry.info.clone();
        self.undo_stack.push_back(entry);
        self.trim();
        Ok(Some(info))
    }

    /// Check if there are commands that can be undone
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if there are commands that can be redone
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get a description of the command that would be undone
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|e| e.info.description.clone())
    }

    /// Get a description of the command that would be redone
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.back().map(|e| e.info.description.clone())
    }

    /// Undoable commands, oldest first
    pub fn undo_stack(&self) -> Vec<CommandInfo> {
        self.undo_stack.iter().map(|e| e.info.clone()).collect()
    }

    /// Redoable commands, the next one to redo last
    pub fn redo_stack(&self) -> Vec<CommandInfo> {
        self.redo_stack.iter().map(|e| e.info.clone()).collect()
    }

    /// Every retained command: the undo history followed by the redo
    /// history in replay order
    pub fn all_commands(&self) -> Vec<CommandInfo> {
        self.undo_stack
            .iter()
            .chain(self.redo_stack.iter().rev())
            .map(|e| e.info.clone())
            .collect()
    }

    /// Clear all command history
    pub fn clear_commands(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Get the number of commands in the undo stack
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of commands in the redo stack
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the history limit, dropping the oldest entries if needed
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.trim();
    }

    fn trim(&mut self) {
        while self.undo_stack.len() > self.capacity {
            if let Some(evicted) = self.undo_stack.pop_front() {
                log::trace!("History full, evicted: {}", evicted.info.description);
            }
        }
        while self.redo_stack.len() > self.capacity {
            self.redo_stack.pop_front();
        }
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UndoStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoStack")
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::trait_def::CommandError;
    use crate::event::{Event, StreamOptions};
    use crate::ids::EventId;

    // Appends one marker to stream "log" so tests can observe ordering
    struct MockCommand {
        value: u64,
        fail_undo: bool,
    }

    impl MockCommand {
        fn new(value: u64) -> Self {
            Self {
                value,
                fail_undo: false,
            }
        }

        fn id(&self) -> String {
            format!("m{}", self.value)
        }
    }

    impl UndoableCommand for MockCommand {
        fn execute(&mut self, state: &mut DocumentState) -> CommandResult<()> {
            state.events.add_events(
                "log",
                vec![Event::automation(self.id(), self.value, "mock", 0.0)],
            );
            Ok(())
        }

        fn undo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
            if self.fail_undo {
                return Err(CommandError::UndoFailed("refused".into()));
            }
            state.events.remove_events("log", &[EventId::from(self.id())]);
            Ok(())
        }

        fn command_type(&self) -> &str {
            "mock"
        }

        fn description(&self) -> String {
            format!("Set value to {}", self.value)
        }
    }

    fn create_test_state() -> DocumentState {
        let mut state = DocumentState::default();
        state
            .events
            .create_stream(StreamOptions::new("Log").with_id("log"))
            .unwrap();
        state
    }

    fn logged(state: &DocumentState) -> usize {
        state.events.get_stream("log").map_or(0, |s| s.len())
    }

    #[test]
    fn test_execute_command() {
        let mut stack = UndoStack::new();
        let mut state = create_test_state();

        stack.execute(Box::new(MockCommand::new(42)), &mut state).unwrap();

        assert_eq!(stack.undo_count(), 1);
        assert_eq!(stack.redo_count(), 0);
        assert!(stack.can_undo());
        assert!(!stack.can_redo());
        assert_eq!(logged(&state), 1);
    }

    #[test]
    fn test_undo() {
        let mut stack = UndoStack::new();
        let mut state = create_test_state();

        stack.execute(Box::new(MockCommand::new(42)), &mut state).unwrap();

        let info = stack.undo_last_command(&mut state).unwrap().unwrap();
        assert_eq!(info.description, "Set value to 42");
        assert_eq!(info.command_type, "mock");
        assert_eq!(stack.undo_count(), 0);
        assert_eq!(stack.redo_count(), 1);
        assert_eq!(logged(&state), 0);
    }

    #[test]
    fn test_undo_is_lifo() {
        let mut stack = UndoStack::new();
        let mut state = create_test_state();

        stack.execute(Box::new(MockCommand::new(1)), &mut state).unwrap();
        stack.execute(Box::new(MockCommand::new(2)), &mut state).unwrap();

        let first = stack.undo_last_command(&mut state).unwrap().unwrap();
        let second = stack.undo_last_command(&mut state).unwrap().unwrap();
        assert_eq!(first.description, "Set value to 2");
        assert_eq!(second.description, "Set value to 1");
    }

    #[test]
    fn test_redo() {
        let mut stack = UndoStack::new();
        let mut state = create_test_state();

        stack.execute(Box::new(MockCommand::new(42)), &mut state).unwrap();
        stack.undo_last_command(&mut state).unwrap();

        let info = stack.redo_last_command(&mut state).unwrap().unwrap();
        assert_eq!(info.description, "Set value to 42");
        assert_eq!(stack.undo_count(), 1);
        assert_eq!(stack.redo_count(), 0);
        assert_eq!(logged(&state), 1);
    }

    #[test]
    fn test_redo_stack_cleared_on_new_command() {
        let mut stack = UndoStack::new();
        let mut state = create_test_state();

        stack.execute(Box::new(MockCommand::new(1)), &mut state).unwrap();
        stack.undo_last_command(&mut state).unwrap();
        stack.execute(Box::new(MockCommand::new(2)), &mut state).unwrap();

        assert!(!stack.can_redo());
        assert_eq!(stack.redo_count(), 0);
    }

    #[test]
    fn test_push_does_not_execute() {
        let mut stack = UndoStack::new();
        let mut state = create_test_state();

        stack.push(Box::new(MockCommand::new(7)));
        assert_eq!(logged(&state), 0);
        assert_eq!(stack.undo_count(), 1);

        // Undoing an entry whose events are absent is a harmless no-op
        assert!(stack.undo_last_command(&mut state).unwrap().is_some());
    }

    #[test]
    fn test_history_limit() {
        let mut stack = UndoStack::with_capacity(3);
        let mut state = create_test_state();

        for i in 0..5 {
            stack.execute(Box::new(MockCommand::new(i)), &mut state).unwrap();
        }

        // Should only keep the last 3
        let kept: Vec<String> = stack.undo_stack().into_iter().map(|c| c.description).collect();
        assert_eq!(
            kept,
            vec!["Set value to 2", "Set value to 3", "Set value to 4"]
        );

        for _ in 0..3 {
            stack.undo_last_command(&mut state).unwrap();
        }
        assert!(stack.undo_last_command(&mut state).unwrap().is_none());
        // The two evicted commands are still applied
        assert_eq!(logged(&state), 2);
    }

    #[test]
    fn test_set_capacity_trims() {
        let mut stack = UndoStack::with_capacity(10);
        let mut state = create_test_state();
        for i in 0..6 {
            stack.execute(Box::new(MockCommand::new(i)), &mut state).unwrap();
        }

        stack.set_capacity(2);
        assert_eq!(stack.undo_count(), 2);
        assert_eq!(stack.undo_description().as_deref(), Some("Set value to 5"));
    }

    #[test]
    fn test_undo_with_empty_stack() {
        let mut stack = UndoStack::new();
        let mut state = create_test_state();

        assert_eq!(stack.undo_last_command(&mut state), Ok(None));
        assert_eq!(stack.redo_last_command(&mut state), Ok(None));
    }

    #[test]
    fn test_failed_undo_keeps_entry() {
        let mut stack = UndoStack::new();
        let mut state = create_test_state();

        let mut cmd = MockCommand::new(3);
        cmd.fail_undo = true;
        stack.execute(Box::new(cmd), &mut state).unwrap();

        assert!(stack.undo_last_command(&mut state).is_err());
        assert_eq!(stack.undo_count(), 1);
        assert_eq!(logged(&state), 1);
    }

    #[test]
    fn test_all_commands_and_clear() {
        let mut stack = UndoStack::new();
        let mut state = create_test_state();
        for i in 0..3 {
            stack.execute(Box::new(MockCommand::new(i)), &mut state).unwrap();
        }
        stack.undo_last_command(&mut state).unwrap();

        let all: Vec<String> = stack.all_commands().into_iter().map(|c| c.description).collect();
        assert_eq!(all, vec!["Set value to 0", "Set value to 1", "Set value to 2"]);

        stack.clear_commands();
        assert!(stack.all_commands().is_empty());
    }
}
