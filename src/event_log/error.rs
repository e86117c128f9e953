use crate::types::{Seq, TurnId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLogErrorKind {
    Storage,
    SequenceViolation,
    Serialization,
    Corrupted,
}

/// Fatal for the turn: the log can no longer guarantee ordering or durability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EventLogError {
    pub kind: EventLogErrorKind,
    pub message: String,
}

impl EventLogError {
    pub fn new(kind: EventLogErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub fn storage_failure(message: impl Into<String>) -> EventLogError {
    EventLogError::new(EventLogErrorKind::Storage, message)
}

pub fn sequence_violation(message: impl Into<String>) -> EventLogError {
    EventLogError::new(EventLogErrorKind::SequenceViolation, message)
}

pub fn serialization_failure(message: impl Into<String>) -> EventLogError {
    EventLogError::new(EventLogErrorKind::Serialization, message)
}

pub fn corrupted(message: impl Into<String>) -> EventLogError {
    EventLogError::new(EventLogErrorKind::Corrupted, message)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionErrorKind {
    Gap,
    ForeignEvent,
    MissingTurnStart,
    FingerprintMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProjectionError {
    pub kind: ProjectionErrorKind,
    pub message: String,
}

impl ProjectionError {
    pub fn new(kind: ProjectionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn gap(turn_id: TurnId, expected: Seq, found: Seq) -> Self {
        Self::new(
            ProjectionErrorKind::Gap,
            format!("turn {turn_id}: expected seq {expected}, found {found}"),
        )
    }
}
