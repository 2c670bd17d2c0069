// UndoableCommand trait definition

use crate::command::state::DocumentState;

/// Result type for command operations
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors that can occur during command execution
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// Command execution failed
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
    /// Undo operation failed
    #[error("Undo failed: {0}")]
    UndoFailed(String),
    /// Redo operation failed
    #[error("Redo failed: {0}")]
    RedoFailed(String),
    /// Invalid state for this operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Trait for commands that support undo/redo
///
/// Every user-visible edit goes through a command so the document history
/// stays consistent across editors. A command captures whatever it needs to
/// reverse itself while executing.
///
/// # Example
/// ```
/// use cardplay_store::command::{CommandResult, DocumentState, UndoableCommand};
/// use cardplay_store::event::Event;
///
/// struct AddNoteCommand {
///     stream: String,
///     note: Event,
/// }
///
/// impl UndoableCommand for AddNoteCommand {
///     fn execute(&mut self, state: &mut DocumentState) -> CommandResult<()> {
///         state.events.add_events(&self.stream, vec![self.note.clone()]);
///         Ok(())
///     }
///
///     fn undo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
///         state.events.remove_events(&self.stream, &[self.note.id.clone()]);
///         Ok(())
///     }
///
///     fn command_type(&self) -> &str {
///         "add-note"
///     }
///
///     fn description(&self) -> String {
///         format!("Add note {}", self.note.id)
///     }
/// }
/// ```
pub trait UndoableCommand: Send {
    /// Perform the edit and remember what is needed to reverse it
    fn execute(&mut self, state: &mut DocumentState) -> CommandResult<()>;

    /// Restore the state observed before `execute`
    fn undo(&mut self, state: &mut DocumentState) -> CommandResult<()>;

    /// Re-apply after an undo
    ///
    /// Defaults to running `execute` again. Commands that create identities
    /// (generated ids) override this to restore the original ones.
    fn redo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        self.execute(state)
    }

    /// Stable machine-readable kind, e.g. "move-notes"
    fn command_type(&self) -> &str;

    /// Human-readable description (e.g. "Undo: Move 3 notes")
    fn description(&self) -> String;
}
