use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerErrorKind {
    Timeout,
    Failure,
    InvalidOutput,
    Panicked,
}

/// Recovered locally: the executor turns every variant into a neutral proposal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct WorkerError {
    pub kind: WorkerErrorKind,
    pub message: String,
}

impl WorkerError {
    pub fn new(kind: WorkerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub fn timeout(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorKind::Timeout, message)
}

pub fn failure(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorKind::Failure, message)
}

pub fn invalid_output(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorKind::InvalidOutput, message)
}

pub fn panicked(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorKind::Panicked, message)
}
