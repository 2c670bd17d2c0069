// Event store - named streams of timed musical events
//
// One stream per track or part. Editors read immutable `Arc<EventStream>`
// snapshots and subscribe per stream; all writes go through `EventStore`.

pub mod store;
pub mod stream;
pub mod types;

pub use store::{ChangeKind, EventStore, EventStoreError, StreamChange};
pub use stream::{EventStream, StreamOptions};
pub use types::{Event, EventKind, EventPatch, EventPayload, Tick, TickDuration};
