use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    decision::Decision,
    deliberation::{ConsensusResult, DoneReason},
    orchestrator::types::{TurnSignals, TurnStage, TurnStatus},
    types::{ClaimId, Seq, SessionId, TurnId, WorkerId},
    worker::{Proposal, WorkerErrorKind},
    workspace::{MergeMode, ModulatorKind, ReductionReport, RetrievedContext, WorkspaceBaseline},
};

/// Immutable log record. Total order is `(session_id, turn_id, seq)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub session_id: SessionId,
    pub turn_id: TurnId,
    pub seq: Seq,
    pub monotonic_ts_us: u64,
    pub wall_ts: String,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "kebab-case")]
pub enum EventPayload {
    TurnStarted {
        user_message: String,
        #[serde(default)]
        constraints: Vec<String>,
        baseline: WorkspaceBaseline,
    },
    StageChanged {
        stage: TurnStage,
    },
    SignalsExtracted {
        signals: TurnSignals,
        levels: BTreeMap<String, f64>,
    },
    ModulatorNudged {
        modulator: ModulatorKind,
        delta: f64,
    },
    ModulatorsDecayed {
        elapsed_ms: u64,
    },
    ContextRetrieved {
        context: RetrievedContext,
    },
    ContextRetrievalFailed {
        error: String,
    },
    WaveScheduled {
        round: u32,
        wave: usize,
        workers: Vec<WorkerId>,
    },
    WorkerStarted {
        round: u32,
        wave: usize,
        worker_id: WorkerId,
    },
    WorkerCompleted {
        round: u32,
        worker_id: WorkerId,
        elapsed_ms: u64,
        mode: MergeMode,
        proposal: Proposal,
    },
    WorkerFailed {
        round: u32,
        worker_id: WorkerId,
        elapsed_ms: u64,
        failure: WorkerErrorKind,
        error: String,
    },
    WorkspacePatched {
        round: u32,
        report: ReductionReport,
    },
    ConsensusUpdated {
        round: u32,
        consensus: ConsensusResult,
    },
    DeliberationCompleted {
        rounds: u32,
        reason: DoneReason,
    },
    SafetyInterrupt {
        matched: String,
    },
    DecisionMade {
        decision: Decision,
    },
    ResponseRendered {
        text: String,
    },
    ResponseFailed {
        error: String,
    },
    ValidationCompleted {
        blocked: bool,
        #[serde(default)]
        reasons: Vec<String>,
        #[serde(default)]
        errors: Vec<String>,
    },
    StateCommitted {
        top_claims: Vec<ClaimId>,
    },
    CommitFailed {
        error: String,
    },
    TurnCompleted {
        status: TurnStatus,
        fingerprint: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    TurnStarted,
    StageChanged,
    SignalsExtracted,
    ModulatorNudged,
    ModulatorsDecayed,
    ContextRetrieved,
    ContextRetrievalFailed,
    WaveScheduled,
    WorkerStarted,
    WorkerCompleted,
    WorkerFailed,
    WorkspacePatched,
    ConsensusUpdated,
    DeliberationCompleted,
    SafetyInterrupt,
    DecisionMade,
    ResponseRendered,
    ResponseFailed,
    ValidationCompleted,
    StateCommitted,
    CommitFailed,
    TurnCompleted,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TurnStarted => "turn-started",
            Self::StageChanged => "stage-changed",
            Self::SignalsExtracted => "signals-extracted",
            Self::ModulatorNudged => "modulator-nudged",
            Self::ModulatorsDecayed => "modulators-decayed",
            Self::ContextRetrieved => "context-retrieved",
            Self::ContextRetrievalFailed => "context-retrieval-failed",
            Self::WaveScheduled => "wave-scheduled",
            Self::WorkerStarted => "worker-started",
            Self::WorkerCompleted => "worker-completed",
            Self::WorkerFailed => "worker-failed",
            Self::WorkspacePatched => "workspace-patched",
            Self::ConsensusUpdated => "consensus-updated",
            Self::DeliberationCompleted => "deliberation-completed",
            Self::SafetyInterrupt => "safety-interrupt",
            Self::DecisionMade => "decision-made",
            Self::ResponseRendered => "response-rendered",
            Self::ResponseFailed => "response-failed",
            Self::ValidationCompleted => "validation-completed",
            Self::StateCommitted => "state-committed",
            Self::CommitFailed => "commit-failed",
            Self::TurnCompleted => "turn-completed",
        }
    }
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::TurnStarted { .. } => EventKind::TurnStarted,
            Self::StageChanged { .. } => EventKind::StageChanged,
            Self::SignalsExtracted { .. } => EventKind::SignalsExtracted,
            Self::ModulatorNudged { .. } => EventKind::ModulatorNudged,
            Self::ModulatorsDecayed { .. } => EventKind::ModulatorsDecayed,
            Self::ContextRetrieved { .. } => EventKind::ContextRetrieved,
            Self::ContextRetrievalFailed { .. } => EventKind::ContextRetrievalFailed,
            Self::WaveScheduled { .. } => EventKind::WaveScheduled,
            Self::WorkerStarted { .. } => EventKind::WorkerStarted,
            Self::WorkerCompleted { .. } => EventKind::WorkerCompleted,
            Self::WorkerFailed { .. } => EventKind::WorkerFailed,
            Self::WorkspacePatched { .. } => EventKind::WorkspacePatched,
            Self::ConsensusUpdated { .. } => EventKind::ConsensusUpdated,
            Self::DeliberationCompleted { .. } => EventKind::DeliberationCompleted,
            Self::SafetyInterrupt { .. } => EventKind::SafetyInterrupt,
            Self::DecisionMade { .. } => EventKind::DecisionMade,
            Self::ResponseRendered { .. } => EventKind::ResponseRendered,
            Self::ResponseFailed { .. } => EventKind::ResponseFailed,
            Self::ValidationCompleted { .. } => EventKind::ValidationCompleted,
            Self::StateCommitted { .. } => EventKind::StateCommitted,
            Self::CommitFailed { .. } => EventKind::CommitFailed,
            Self::TurnCompleted { .. } => EventKind::TurnCompleted,
        }
    }
}
