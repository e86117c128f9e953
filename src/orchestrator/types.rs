use serde::{Deserialize, Serialize};

use crate::{
    decision::Decision,
    deliberation::{ConsensusResult, DoneReason},
    types::{ClaimId, SessionId, TurnId, WorkerId},
    workspace::Claim,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStage {
    Ingest,
    Signals,
    Retrieval,
    Waves,
    Deliberation,
    Decision,
    Response,
    Validation,
    Commit,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Completed,
    SafetyInterrupted,
}

/// Cheap per-message signals computed before any worker runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnSignals {
    pub interrogative: bool,
    pub intensity: f64,
    pub inquiry: f64,
    #[serde(default)]
    pub risk: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnInput {
    pub user_message: String,
    #[serde(default)]
    pub constraints: Vec<String>,
}

impl TurnInput {
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            constraints: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub session_id: SessionId,
    pub turn_id: TurnId,
    pub status: TurnStatus,
    pub decision: Decision,
    pub response: Option<String>,
    pub critic_blocked: bool,
    pub critic_reasons: Vec<String>,
    pub consensus: Option<ConsensusResult>,
    pub follow_up_rounds: u32,
    pub done_reason: Option<DoneReason>,
    pub failed_workers: Vec<WorkerId>,
    pub fingerprint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticVerdict {
    pub blocked: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl CriticVerdict {
    pub fn pass() -> Self {
        Self::default()
    }

    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            blocked: true,
            reason: Some(reason.into()),
        }
    }
}

/// What a turn hands to long-term memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub session_id: SessionId,
    pub turn_id: TurnId,
    pub user_message: String,
    pub decision: Decision,
    pub response: Option<String>,
    pub top_claims: Vec<Claim>,
    pub top_claim_ids: Vec<ClaimId>,
}
