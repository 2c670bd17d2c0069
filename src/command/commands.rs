// Concrete event commands
//
// Each command remembers what it replaced while executing so undo restores
// the previous observable state of every store it touched. Event edits keep
// the stream snapshot they started from and put it back verbatim, so undo
// also restores where each event sat in the list.

use crate::command::state::DocumentState;
use crate::command::trait_def::{CommandError, CommandResult, UndoableCommand};
use crate::event::{Event, EventPatch, EventStream, StreamOptions};
use crate::ids::{EventId, StreamId};
use crate::selection::Selection;
use std::sync::Arc;

/// Current snapshot of a stream, or `InvalidState` if it does not exist
fn snapshot(state: &DocumentState, stream_id: &StreamId) -> CommandResult<Arc<EventStream>> {
    state.events.get_stream(stream_id).ok_or_else(|| {
        CommandError::InvalidState(format!("Stream {} does not exist", stream_id))
    })
}

/// Write a snapshot's event list back into its stream
fn restore(state: &mut DocumentState, previous: Option<&Arc<EventStream>>) -> CommandResult<()> {
    let previous =
        previous.ok_or_else(|| CommandError::UndoFailed("No previous stream stored".into()))?;
    state
        .events
        .set_stream(&previous.id, previous.events().to_vec());
    Ok(())
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// Command to add events to a stream
///
/// Undo removes exactly the appended events, even when one of them reuses
/// the id of an event that was already there.
pub struct AddEventsCommand {
    stream_id: StreamId,
    events: Vec<Event>,
    previous: Option<Arc<EventStream>>,
}

impl AddEventsCommand {
    pub fn new(stream_id: impl Into<StreamId>, events: Vec<Event>) -> Self {
        Self {
            stream_id: stream_id.into(),
            events,
            previous: None,
        }
    }
}

impl UndoableCommand for AddEventsCommand {
    fn execute(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        self.previous = Some(snapshot(state, &self.stream_id)?);
        state.events.add_events(&self.stream_id, self.events.clone());
        Ok(())
    }

    fn undo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        if self.events.is_empty() {
            return Ok(());
        }
        restore(state, self.previous.as_ref())
    }

    fn command_type(&self) -> &str {
        "add-events"
    }

    fn description(&self) -> String {
        format!(
            "Add {} event{}",
            self.events.len(),
            plural(self.events.len())
        )
    }
}

/// Command to remove events from a stream
///
/// When the document prunes selections on delete, the removed ids are also
/// deselected, and reselected on undo.
pub struct RemoveEventsCommand {
    stream_id: StreamId,
    event_ids: Vec<EventId>,
    previous: Option<Arc<EventStream>>,
    removed: Vec<Event>,
    deselected: Vec<EventId>,
}

impl RemoveEventsCommand {
    pub fn new(stream_id: impl Into<StreamId>, event_ids: Vec<EventId>) -> Self {
        Self {
            stream_id: stream_id.into(),
            event_ids,
            previous: None,
            removed: Vec::new(),
            deselected: Vec::new(),
        }
    }
}

impl UndoableCommand for RemoveEventsCommand {
    fn execute(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        self.previous = Some(snapshot(state, &self.stream_id)?);
        self.removed = state.events.remove_events(&self.stream_id, &self.event_ids);

        self.deselected.clear();
        if state.prune_selection_on_delete {
            self.deselected = self
                .removed
                .iter()
                .filter(|e| state.selection.is_selected(&self.stream_id, &e.id))
                .map(|e| e.id.clone())
                .collect();
            state.selection.deselect(&self.stream_id, &self.deselected);
        }
        Ok(())
    }

    fn undo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        if !self.removed.is_empty() {
            restore(state, self.previous.as_ref())?;
        }
        if !self.deselected.is_empty() {
            state
                .selection
                .select(&self.stream_id, self.deselected.iter().cloned());
        }
        Ok(())
    }

    fn command_type(&self) -> &str {
        "remove-events"
    }

    fn description(&self) -> String {
        format!(
            "Delete {} event{}",
            self.event_ids.len(),
            plural(self.event_ids.len())
        )
    }
}

/// Command to merge-patch one event
pub struct UpdateEventCommand {
    stream_id: StreamId,
    event_id: EventId,
    patch: EventPatch,
    previous: Option<Arc<EventStream>>,
}

impl UpdateEventCommand {
    pub fn new(
        stream_id: impl Into<StreamId>,
        event_id: impl Into<EventId>,
        patch: EventPatch,
    ) -> Self {
        Self {
            stream_id: stream_id.into(),
            event_id: event_id.into(),
            patch,
            previous: None,
        }
    }
}

impl UndoableCommand for UpdateEventCommand {
    fn execute(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        let previous = snapshot(state, &self.stream_id)?;
        state
            .events
            .update_event(&self.stream_id, &self.event_id, &self.patch)
            .ok_or_else(|| {
                CommandError::InvalidState(format!(
                    "Event {} not found in stream {}",
                    self.event_id, self.stream_id
                ))
            })?;
        self.previous = Some(previous);
        Ok(())
    }

    fn undo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        restore(state, self.previous.as_ref())
    }

    fn command_type(&self) -> &str {
        "update-event"
    }

    fn description(&self) -> String {
        format!("Edit event {}", self.event_id)
    }
}

/// Command to shift a set of events in time and pitch
///
/// Starts clamp at tick 0 and pitches at 0..=127; undo restores the exact
/// previous stream, so clamping loses nothing.
pub struct MoveEventsCommand {
    stream_id: StreamId,
    event_ids: Vec<EventId>,
    tick_delta: i64,
    pitch_delta: i16,
    previous: Option<Arc<EventStream>>,
    moved: usize,
}

impl MoveEventsCommand {
    pub fn new(
        stream_id: impl Into<StreamId>,
        event_ids: Vec<EventId>,
        tick_delta: i64,
        pitch_delta: i16,
    ) -> Self {
        Self {
            stream_id: stream_id.into(),
            event_ids,
            tick_delta,
            pitch_delta,
            previous: None,
            moved: 0,
        }
    }

    fn shift(&self, mut event: Event) -> Event {
        event.start = if self.tick_delta >= 0 {
            event.start.saturating_add(self.tick_delta.unsigned_abs())
        } else {
            event.start.saturating_sub(self.tick_delta.unsigned_abs())
        };
        if let Some(pitch) = event.pitch() {
            let shifted = (pitch as i16 + self.pitch_delta).clamp(0, 127) as u8;
            EventPatch::new().with_pitch(shifted).apply(&mut event);
        }
        event
    }
}

impl UndoableCommand for MoveEventsCommand {
    fn execute(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        let previous = snapshot(state, &self.stream_id)?;
        self.moved = previous
            .events()
            .iter()
            .filter(|e| self.event_ids.contains(&e.id))
            .count();
        self.previous = Some(previous);
        if self.moved == 0 {
            return Ok(());
        }

        state.events.update_stream(&self.stream_id, |events| {
            events
                .iter()
                .map(|event| {
                    if self.event_ids.contains(&event.id) {
                        self.shift(event.clone())
                    } else {
                        event.clone()
                    }
                })
                .collect()
        });
        Ok(())
    }

    fn undo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        if self.moved == 0 {
            return Ok(());
        }
        restore(state, self.previous.as_ref())
    }

    fn command_type(&self) -> &str {
        "move-events"
    }

    fn description(&self) -> String {
        format!(
            "Move {} event{}",
            self.event_ids.len(),
            plural(self.event_ids.len())
        )
    }
}

/// Command to replace every event of a stream
pub struct SetStreamCommand {
    stream_id: StreamId,
    events: Vec<Event>,
    previous: Option<Arc<EventStream>>,
}

impl SetStreamCommand {
    pub fn new(stream_id: impl Into<StreamId>, events: Vec<Event>) -> Self {
        Self {
            stream_id: stream_id.into(),
            events,
            previous: None,
        }
    }
}

impl UndoableCommand for SetStreamCommand {
    fn execute(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        self.previous = Some(snapshot(state, &self.stream_id)?);
        state.events.set_stream(&self.stream_id, self.events.clone());
        Ok(())
    }

    fn undo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        restore(state, self.previous.as_ref())
    }

    fn command_type(&self) -> &str {
        "set-stream"
    }

    fn description(&self) -> String {
        format!("Replace events of {}", self.stream_id)
    }
}

/// Command to create a stream
///
/// Redo re-creates the stream under the id the first run produced.
pub struct CreateStreamCommand {
    options: StreamOptions,
    created: Option<StreamId>,
}

impl CreateStreamCommand {
    pub fn new(options: StreamOptions) -> Self {
        Self {
            options,
            created: None,
        }
    }

    /// Id of the created stream, once executed
    pub fn stream_id(&self) -> Option<&StreamId> {
        self.created.as_ref()
    }
}

impl UndoableCommand for CreateStreamCommand {
    fn execute(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        let mut options = self.options.clone();
        if let Some(id) = &self.created {
            options.id = Some(id.clone());
        }
        let stream = state
            .events
            .create_stream(options)
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
        self.created = Some(stream.id.clone());
        Ok(())
    }

    fn undo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        let id = self
            .created
            .as_ref()
            .ok_or_else(|| CommandError::UndoFailed("Stream was never created".into()))?;
        state.events.remove_stream(id);
        state.selection.remove_stream(id);
        Ok(())
    }

    fn command_type(&self) -> &str {
        "create-stream"
    }

    fn description(&self) -> String {
        format!("Create stream {}", self.options.name)
    }
}

/// Command to delete a stream and its selection
///
/// Undo puts the stream back at its previous position with its selection.
pub struct DeleteStreamCommand {
    stream_id: StreamId,
    removed: Option<(Arc<EventStream>, usize)>,
    selection: Selection,
}

impl DeleteStreamCommand {
    pub fn new(stream_id: impl Into<StreamId>) -> Self {
        Self {
            stream_id: stream_id.into(),
            removed: None,
            selection: Selection::new(),
        }
    }
}

impl UndoableCommand for DeleteStreamCommand {
    fn execute(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        let index = state.events.stream_index(&self.stream_id).ok_or_else(|| {
            CommandError::InvalidState(format!("Stream {} does not exist", self.stream_id))
        })?;
        let stream = state.events.remove_stream(&self.stream_id).ok_or_else(|| {
            CommandError::InvalidState(format!("Stream {} does not exist", self.stream_id))
        })?;
        self.removed = Some((stream, index));
        self.selection = state.selection.remove_stream(&self.stream_id);
        Ok(())
    }

    fn undo(&mut self, state: &mut DocumentState) -> CommandResult<()> {
        let (stream, index) = self
            .removed
            .as_ref()
            .ok_or_else(|| CommandError::UndoFailed("No deleted stream stored".into()))?;

        state.events.insert_stream((**stream).clone(), *index);
        if !self.selection.is_empty() {
            state
                .selection
                .set_selection(&self.stream_id, self.selection.iter().cloned());
        }
        Ok(())
    }

    fn command_type(&self) -> &str {
        "delete-stream"
    }

    fn description(&self) -> String {
        format!("Delete stream {}", self.stream_id)
    }
}
