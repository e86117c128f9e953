use crate::event_log::{EventLogError, ProjectionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorErrorKind {
    Retrieval,
    Render,
    Critic,
    Commit,
}

/// Failure of an external collaborator. Never fatal; it becomes an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CollaboratorError {
    pub kind: CollaboratorErrorKind,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(kind: CollaboratorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub fn retrieval_failed(message: impl Into<String>) -> CollaboratorError {
    CollaboratorError::new(CollaboratorErrorKind::Retrieval, message)
}

pub fn render_failed(message: impl Into<String>) -> CollaboratorError {
    CollaboratorError::new(CollaboratorErrorKind::Render, message)
}

pub fn critic_failed(message: impl Into<String>) -> CollaboratorError {
    CollaboratorError::new(CollaboratorErrorKind::Critic, message)
}

pub fn commit_failed(message: impl Into<String>) -> CollaboratorError {
    CollaboratorError::new(CollaboratorErrorKind::Commit, message)
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("event log failure: {0}")]
    EventLog(#[from] EventLogError),
    #[error("session projection failed: {0}")]
    Projection(#[from] ProjectionError),
    #[error("invalid turn input: {0}")]
    InvalidInput(String),
}
