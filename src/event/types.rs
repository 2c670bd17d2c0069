// Event representation
// An event is a timed musical unit on the tick grid with a kind-specific payload

use crate::ids::EventId;
use serde::{Deserialize, Serialize};

/// Position on the musical grid
pub type Tick = u64;

/// Length on the musical grid
pub type TickDuration = u64;

/// Event kinds, one per payload shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Note,
    Automation,
    Marker,
}

/// Kind-specific event data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// MIDI-style note (pitch and velocity 0-127, 60 = C4)
    Note { pitch: u8, velocity: u8 },
    /// Automation point for a named parameter
    Automation { parameter: String, value: f32 },
    /// Named position on the timeline (section, cue)
    Marker { label: String },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Note { .. } => EventKind::Note,
            EventPayload::Automation { .. } => EventKind::Automation,
            EventPayload::Marker { .. } => EventKind::Marker,
        }
    }
}

/// A single timed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Stable for the event's lifetime, unique within its stream
    pub id: EventId,

    pub start: Tick,

    pub duration: TickDuration,

    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    pub fn new(
        id: impl Into<EventId>,
        start: Tick,
        duration: TickDuration,
        payload: EventPayload,
    ) -> Self {
        Self {
            id: id.into(),
            start,
            duration,
            payload,
        }
    }

    /// Creates a note event
    ///
    /// # Panics
    /// Panics if `pitch` or `velocity` is above 127. Callers holding
    /// unchecked input clamp it first.
    pub fn note(
        id: impl Into<EventId>,
        start: Tick,
        duration: TickDuration,
        pitch: u8,
        velocity: u8,
    ) -> Self {
        assert!(pitch <= 127, "MIDI pitch must be 0-127");
        assert!(velocity <= 127, "MIDI velocity must be 0-127");

        Self::new(id, start, duration, EventPayload::Note { pitch, velocity })
    }

    /// Creates an automation point (zero duration)
    pub fn automation(
        id: impl Into<EventId>,
        start: Tick,
        parameter: impl Into<String>,
        value: f32,
    ) -> Self {
        Self::new(
            id,
            start,
            0,
            EventPayload::Automation {
                parameter: parameter.into(),
                value,
            },
        )
    }

    /// Creates a timeline marker (zero duration)
    pub fn marker(id: impl Into<EventId>, start: Tick, label: impl Into<String>) -> Self {
        Self::new(
            id,
            start,
            0,
            EventPayload::Marker {
                label: label.into(),
            },
        )
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// First tick after the event
    pub fn end(&self) -> Tick {
        self.start.saturating_add(self.duration)
    }

    /// Whether the event overlaps the half-open range `[start, end)`
    pub fn overlaps(&self, start: Tick, end: Tick) -> bool {
        // Zero-length events count as a point at `start`
        if self.duration == 0 {
            return self.start >= start && self.start < end;
        }
        self.start < end && self.end() > start
    }

    /// Pitch of a note event
    pub fn pitch(&self) -> Option<u8> {
        match self.payload {
            EventPayload::Note { pitch, .. } => Some(pitch),
            _ => None,
        }
    }

    /// Velocity of a note event
    pub fn velocity(&self) -> Option<u8> {
        match self.payload {
            EventPayload::Note { velocity, .. } => Some(velocity),
            _ => None,
        }
    }
}

/// Merge patch for a single event
///
/// Only the fields that are `Some` are applied. `pitch` and `velocity` only
/// touch note events and are applied after `payload`. The id is never patched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub start: Option<Tick>,
    pub duration: Option<TickDuration>,
    pub payload: Option<EventPayload>,
    pub pitch: Option<u8>,
    pub velocity: Option<u8>,
}

impl EventPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A patch that restores every field of `event`
    pub fn from_event(event: &Event) -> Self {
        Self {
            start: Some(event.start),
            duration: Some(event.duration),
            payload: Some(event.payload.clone()),
            pitch: None,
            velocity: None,
        }
    }

    pub fn with_start(mut self, start: Tick) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_duration(mut self, duration: TickDuration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_payload(mut self, payload: EventPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_pitch(mut self, pitch: u8) -> Self {
        self.pitch = Some(pitch.min(127));
        self
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = Some(velocity.min(127));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.duration.is_none()
            && self.payload.is_none()
            && self.pitch.is_none()
            && self.velocity.is_none()
    }

    /// Apply the patch in place
    pub fn apply(&self, event: &mut Event) {
        if let Some(start) = self.start {
            event.start = start;
        }
        if let Some(duration) = self.duration {
            event.duration = duration;
        }
        if let Some(payload) = &self.payload {
            event.payload = payload.clone();
        }
        if let EventPayload::Note { pitch, velocity } = &mut event.payload {
            if let Some(new_pitch) = self.pitch {
                *pitch = new_pitch;
            }
            if let Some(new_velocity) = self.velocity {
                *velocity = new_velocity;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_creation() {
        let note = Event::note("n1", 0, 96, 60, 100);

        assert_eq!(note.id.as_str(), "n1");
        assert_eq!(note.kind(), EventKind::Note);
        assert_eq!(note.pitch(), Some(60));
        assert_eq!(note.velocity(), Some(100));
        assert_eq!(note.end(), 96);
    }

    #[test]
    fn test_overlaps() {
        let note = Event::note("n1", 96, 96, 60, 100);

        assert!(note.overlaps(0, 97));
        assert!(note.overlaps(191, 300));
        assert!(!note.overlaps(0, 96));
        assert!(!note.overlaps(192, 300));

        let point = Event::automation("a1", 48, "cutoff", 0.5);
        assert!(point.overlaps(48, 49));
        assert!(!point.overlaps(0, 48));
    }

    #[test]
    fn test_patch_moves_note() {
        let mut note = Event::note("n1", 0, 96, 60, 100);
        EventPatch::new().with_start(200).with_pitch(62).apply(&mut note);

        assert_eq!(note.start, 200);
        assert_eq!(note.pitch(), Some(62));
        assert_eq!(note.velocity(), Some(100));
        assert_eq!(note.duration, 96);
    }

    #[test]
    fn test_pitch_patch_ignored_on_automation() {
        let mut point = Event::automation("a1", 0, "cutoff", 0.25);
        let before = point.clone();
        EventPatch::new().with_pitch(62).apply(&mut point);

        assert_eq!(point, before);
    }

    #[test]
    fn test_from_event_restores() {
        let original = Event::note("n1", 10, 20, 64, 90);
        let mut edited = original.clone();
        EventPatch::new()
            .with_start(99)
            .with_payload(EventPayload::Marker {
                label: "verse".to_string(),
            })
            .apply(&mut edited);
        assert_eq!(edited.kind(), EventKind::Marker);

        EventPatch::from_event(&original).apply(&mut edited);
        assert_eq!(edited, original);
    }

    #[test]
    fn test_payload_is_tagged_by_kind() {
        let note = Event::note("n1", 0, 96, 60, 100);
        let json = serde_json::to_value(&note).unwrap();

        assert_eq!(json["kind"], "note");
        assert_eq!(json["pitch"], 60);
        assert_eq!(json["id"], "n1");

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, note);
    }

    #[test]
    #[should_panic(expected = "MIDI pitch must be 0-127")]
    fn test_invalid_pitch() {
        Event::note("n1", 0, 96, 128, 100);
    }

    #[test]
    #[should_panic(expected = "MIDI velocity must be 0-127")]
    fn test_invalid_velocity() {
        Event::note("n1", 0, 96, 60, 128);
    }
}
