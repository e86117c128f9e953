pub mod error;
pub mod log;
pub mod projection;
pub mod store;
pub mod types;

pub use error::{EventLogError, EventLogErrorKind, ProjectionError, ProjectionErrorKind};
pub use log::{EventLog, EventLogReader};
pub use projection::{TurnTranscript, apply_event, project_session, project_turn};
pub use store::{EventStore, MemoryEventStore, SqliteEventStore};
pub use types::{Event, EventKind, EventPayload};
