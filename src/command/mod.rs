// Command Pattern for Undo/Redo functionality
//
// Any subsystem (event edits, routing edits, command-palette actions) records
// its edits here so every editor shares one history.
//
// Architecture:
// - UndoableCommand trait: Defines execute(), undo(), redo(), description()
// - UndoStack: Bounded undo/redo stacks
// - CommandDescriptor: closure-based edits for execute_with_undo
// - Concrete commands: AddEventsCommand, MoveEventsCommand, etc.
//
// Commands operate on DocumentState, which holds every store of a document,
// and store what they replaced so undo restores the previous state.

pub mod closure;
pub mod commands;
pub mod manager;
pub mod recent;
pub mod state;
pub mod trait_def;

pub use closure::{ClosureCommand, CommandDescriptor};
pub use commands::{
    AddEventsCommand, CreateStreamCommand, DeleteStreamCommand, MoveEventsCommand,
    RemoveEventsCommand, SetStreamCommand, UpdateEventCommand,
};
pub use manager::{CommandInfo, UndoStack};
pub use recent::RecentItems;
pub use state::DocumentState;
pub use trait_def::{CommandError, CommandResult, UndoableCommand};
