// Closure-based commands for one-off edits
//
// Adapters that do not want a dedicated command type describe an edit with
// three closures. `execute` runs once, its result is kept and handed to both
// `undo` and `redo`, so a redo can restore exactly what the first run
// created instead of creating it again.

use crate::command::manager::UndoStack;
use crate::command::state::DocumentState;
use crate::command::trait_def::{CommandResult, UndoableCommand};

/// Boxed inverse/replay closure
pub type ReplayFn<R> = Box<dyn FnMut(&mut DocumentState, &R) + Send>;

/// Description of an undoable edit
pub struct CommandDescriptor<E, U, D> {
    pub command_type: String,
    pub description: String,
    /// Forward action, run immediately
    pub execute: E,
    /// Reverses the forward action given its result
    pub undo: U,
    /// Re-applies the forward action given the original result
    pub redo: D,
}

/// Command built from a descriptor after its forward action ran
pub struct ClosureCommand<R> {
    command_type: String,
    description: String,
    result: R,
    undo: ReplayFn<R>,
    redo: ReplayFn<R>,
}

impl<R> ClosureCommand<R> {
    /// The value the forward action produced
    pub fn result(&self) -> &R {
        &self.result
    }
}

impl<R: Send + 'static> UndoableCommand for ClosureCommand<R> {
    fn execute(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        (self.redo)(state, &self.result);
        Ok(())
    }

    fn undo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        (self.undo)(state, &self.result);
        Ok(())
    }

    fn command_type(&self) -> &str {
        &self.command_type
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

impl UndoStack {
    /// Run `descriptor.execute` now and record the edit
    ///
    /// Returns whatever `execute` returned.
    pub fn execute_with_undo<R, E, U, D>(
        &mut self,
        state: &mut DocumentState,
        descriptor: CommandDescriptor<E, U, D>,
    ) -> R
    where
        R: Clone + Send + 'static,
        E: FnOnce(&mut DocumentState) -> R,
        U: FnMut(&mut DocumentState, &R) + Send + 'static,
        D: FnMut(&mut DocumentState, &R) + Send + 'static,
    {
        let result = (descriptor.execute)(state);
        self.push(Box::new(ClosureCommand {
            command_type: descriptor.command_type,
            description: descriptor.description,
            result: result.clone(),
            undo: Box::new(descriptor.undo),
            redo: Box::new(descriptor.redo),
        }));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, EventPatch, StreamOptions};

    fn state_with_note() -> DocumentState {
        let mut state = DocumentState::default();
        state
            .events
            .create_stream(
                StreamOptions::new("Lead")
                    .with_id("s")
                    .with_events(vec![Event::note("n1", 0, 96, 60, 100)]),
            )
            .unwrap();
        state
    }

    fn note(state: &DocumentState) -> Event {
        state
            .events
            .get_stream("s")
            .and_then(|s| s.event("n1").cloned())
            .unwrap()
    }

    #[test]
    fn test_execute_with_undo_returns_result_and_threads_it() {
        let mut stack = UndoStack::new();
        let mut state = state_with_note();

        let previous = stack.execute_with_undo(
            &mut state,
            CommandDescriptor {
                command_type: "move-note".to_string(),
                description: "Move note".to_string(),
                execute: |state: &mut DocumentState| {
                    state
                        .events
                        .update_event("s", "n1", &EventPatch::new().with_start(200).with_pitch(62))
                },
                undo: |state: &mut DocumentState, previous: &Option<Event>| {
                    if let Some(previous) = previous {
                        state
                            .events
                            .update_event("s", "n1", &EventPatch::from_event(previous));
                    }
                },
                redo: |state: &mut DocumentState, _: &Option<Event>| {
                    state
                        .events
                        .update_event("s", "n1", &EventPatch::new().with_start(200).with_pitch(62));
                },
            },
        );

        assert_eq!(previous.map(|e| e.start), Some(0));
        assert_eq!(note(&state).start, 200);

        stack.undo_last_command(&mut state).unwrap();
        assert_eq!(note(&state), Event::note("n1", 0, 96, 60, 100));

        stack.redo_last_command(&mut state).unwrap();
        assert_eq!(note(&state).pitch(), Some(62));
    }

    #[test]
    fn test_descriptor_metadata_recorded() {
        let mut stack = UndoStack::new();
        let mut state = DocumentState::default();

        let value = stack.execute_with_undo(
            &mut state,
            CommandDescriptor {
                command_type: "noop".to_string(),
                description: "Nothing".to_string(),
                execute: |_: &mut DocumentState| 42,
                undo: |_: &mut DocumentState, _: &i32| {},
                redo: |_: &mut DocumentState, _: &i32| {},
            },
        );

        assert_eq!(value, 42);
        let history = stack.undo_stack();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].command_type, "noop");
        assert_eq!(history[0].description, "Nothing");
    }
}
