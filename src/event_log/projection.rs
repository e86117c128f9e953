use serde::{Deserialize, Serialize};

use crate::{
    decision::Decision,
    deliberation::{ConsensusResult, DoneReason},
    event_log::{
        error::{ProjectionError, ProjectionErrorKind},
        types::{Event, EventPayload},
    },
    orchestrator::types::{TurnStage, TurnStatus},
    types::{SessionId, TurnId, WorkerId},
    workspace::{Reducer, ReductionReport, Workspace},
};

/// Applies one event to the workspace. The live orchestrator and replay share this path.
pub fn apply_event(
    reducer: &Reducer,
    mut workspace: Workspace,
    event: &Event,
) -> (Workspace, Option<ReductionReport>) {
    match &event.payload {
        EventPayload::TurnStarted {
            user_message,
            constraints,
            baseline,
        } => {
            workspace.restore_baseline(baseline);
            workspace.begin_turn(event.turn_id, user_message, constraints);
            (workspace, None)
        }
        EventPayload::ModulatorNudged { modulator, delta } => {
            (reducer.nudge_modulator(workspace, *modulator, *delta), None)
        }
        EventPayload::ModulatorsDecayed { elapsed_ms } => {
            (reducer.decay_modulators(workspace, *elapsed_ms), None)
        }
        EventPayload::ContextRetrieved { context } => {
            workspace.set_retrieved(context.clone());
            (workspace, None)
        }
        EventPayload::WorkerCompleted { proposal, mode, .. } => {
            let reduction = reducer.reduce(workspace, proposal, *mode);
            (reduction.workspace, Some(reduction.report))
        }
        _ => (workspace, None),
    }
}

/// Rebuilds the workspace of a single turn from a fresh instance.
/// Only maintenance events may precede `turn-started`.
pub fn project_turn(reducer: &Reducer, events: &[Event]) -> Result<Workspace, ProjectionError> {
    let Some(first) = events.first() else {
        return Err(ProjectionError::new(
            ProjectionErrorKind::MissingTurnStart,
            "no events to project",
        ));
    };
    let headless = events
        .iter()
        .take_while(|event| !matches!(event.payload, EventPayload::TurnStarted { .. }))
        .any(|event| !is_maintenance(&event.payload));
    if headless {
        return Err(ProjectionError::new(
            ProjectionErrorKind::MissingTurnStart,
            format!("turn {} does not open with turn-started", first.turn_id),
        ));
    }
    let workspace = Workspace::new(first.session_id.clone());
    replay_turn_events(reducer, workspace, events)
}

fn is_maintenance(payload: &EventPayload) -> bool {
    matches!(
        payload,
        EventPayload::ModulatorNudged { .. } | EventPayload::ModulatorsDecayed { .. }
    )
}

/// Rebuilds the workspace of a whole session, turn by turn.
pub fn project_session(
    reducer: &Reducer,
    session_id: &str,
    events: &[Event],
) -> Result<Workspace, ProjectionError> {
    let mut workspace = Workspace::new(session_id.to_string());
    let mut start = 0;
    while start < events.len() {
        let turn_id = events[start].turn_id;
        let end = events[start..]
            .iter()
            .position(|event| event.turn_id != turn_id)
            .map_or(events.len(), |offset| start + offset);
        workspace = replay_turn_events(reducer, workspace, &events[start..end])?;
        start = end;
    }
    Ok(workspace)
}

fn replay_turn_events(
    reducer: &Reducer,
    mut workspace: Workspace,
    events: &[Event],
) -> Result<Workspace, ProjectionError> {
    let Some(first) = events.first() else {
        return Ok(workspace);
    };
    for (expected, event) in events.iter().enumerate() {
        if event.session_id != first.session_id || event.turn_id != first.turn_id {
            return Err(ProjectionError::new(
                ProjectionErrorKind::ForeignEvent,
                format!(
                    "event ({}, {}, {}) does not belong to turn ({}, {})",
                    event.session_id, event.turn_id, event.seq, first.session_id, first.turn_id
                ),
            ));
        }
        if event.seq != expected as u64 {
            return Err(ProjectionError::gap(event.turn_id, expected as u64, event.seq));
        }
        if let EventPayload::TurnCompleted { fingerprint, .. } = &event.payload {
            let replayed = workspace.fingerprint();
            if &replayed != fingerprint {
                return Err(ProjectionError::new(
                    ProjectionErrorKind::FingerprintMismatch,
                    format!(
                        "turn {} replayed to {replayed}, log recorded {fingerprint}",
                        event.turn_id
                    ),
                ));
            }
        }
        workspace = apply_event(reducer, workspace, event).0;
    }
    Ok(workspace)
}

/// Summary of one turn reconstructed from its events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnTranscript {
    pub session_id: SessionId,
    pub turn_id: TurnId,
    pub user_message: String,
    pub stages: Vec<TurnStage>,
    pub follow_up_rounds: u32,
    pub done_reason: Option<DoneReason>,
    pub completed_workers: Vec<WorkerId>,
    pub failed_workers: Vec<WorkerId>,
    pub final_consensus: Option<ConsensusResult>,
    pub decision: Option<Decision>,
    pub response: Option<String>,
    pub critic_blocked: bool,
    pub safety_interrupt: Option<String>,
    pub status: Option<TurnStatus>,
}

impl TurnTranscript {
    pub fn from_events(events: &[Event]) -> Self {
        let mut transcript = Self::default();
        if let Some(first) = events.first() {
            transcript.session_id = first.session_id.clone();
            transcript.turn_id = first.turn_id;
        }
        for event in events {
            match &event.payload {
                EventPayload::TurnStarted { user_message, .. } => {
                    transcript.user_message = user_message.clone();
                }
                EventPayload::StageChanged { stage } => transcript.stages.push(*stage),
                EventPayload::WorkerCompleted { worker_id, .. } => {
                    transcript.completed_workers.push(worker_id.clone());
                }
                EventPayload::WorkerFailed { worker_id, .. } => {
                    transcript.failed_workers.push(worker_id.clone());
                }
                EventPayload::ConsensusUpdated { consensus, .. } => {
                    transcript.final_consensus = Some(consensus.clone());
                }
                EventPayload::DeliberationCompleted { rounds, reason } => {
                    transcript.follow_up_rounds = *rounds;
                    transcript.done_reason = Some(*reason);
                }
                EventPayload::SafetyInterrupt { matched } => {
                    transcript.safety_interrupt = Some(matched.clone());
                }
                EventPayload::DecisionMade { decision } => {
                    transcript.decision = Some(decision.clone());
                }
                EventPayload::ResponseRendered { text } => {
                    transcript.response = Some(text.clone());
                }
                EventPayload::ValidationCompleted { blocked, .. } => {
                    transcript.critic_blocked = *blocked;
                }
                EventPayload::TurnCompleted { status, .. } => {
                    transcript.status = Some(*status);
                }
                _ => {}
            }
        }
        transcript
    }
}
