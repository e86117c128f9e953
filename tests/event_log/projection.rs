use std::collections::{BTreeMap, BTreeSet};

use concord::{
    event_log::{
        EventLog, EventPayload, ProjectionErrorKind, TurnTranscript, project_session,
        project_turn,
    },
    orchestrator::{TurnStage, TurnStatus},
    worker::Proposal,
    workspace::{Claim, ClaimType, MergeMode, Reducer, derive_claim_id},
};

use super::{nudge, stage, turn_started};

fn completed(worker_id: &str, text: &str) -> EventPayload {
    let mut proposal = Proposal::neutral(worker_id);
    proposal.claims.push(Claim {
        id: derive_claim_id(ClaimType::Concern, text),
        text: text.to_string(),
        claim_type: ClaimType::Concern,
        source: worker_id.to_string(),
        urgency: 2.0,
        confidence: 2.0,
        supports: Vec::new(),
        opposes: Vec::new(),
        contributors: BTreeSet::from([worker_id.to_string()]),
        assertions: BTreeMap::new(),
    });
    EventPayload::WorkerCompleted {
        round: 0,
        worker_id: worker_id.to_string(),
        elapsed_ms: 3,
        mode: MergeMode::Append,
        proposal,
    }
}

#[test]
fn given_turn_events_when_projected_then_claims_and_modulators_are_rebuilt() {
    let reducer = Reducer::default();
    let mut log = EventLog::in_memory();
    log.record("s1", 1, turn_started("i am exhausted")).expect("record");
    log.record("s1", 1, nudge(0.1)).expect("record");
    log.record("s1", 1, completed("empathy", "user is exhausted")).expect("record");

    let events = log.reader().replay("s1", 1).expect("replay");
    let workspace = project_turn(&reducer, &events).expect("project");

    assert_eq!(workspace.turn_id, 1);
    assert_eq!(workspace.context.user_message, "i am exhausted");
    assert_eq!(workspace.active_claims.len(), 1);
    assert!((workspace.modulators.arousal - 0.4).abs() < 1e-12);
}

#[test]
fn given_matching_fingerprint_when_projected_then_accepted_and_mismatch_rejected() {
    let reducer = Reducer::default();
    let mut log = EventLog::in_memory();
    log.record("s1", 1, turn_started("hello")).expect("record");
    log.record("s1", 1, completed("empathy", "user says hello")).expect("record");
    let partial = log.reader().replay("s1", 1).expect("replay");
    let expected = project_turn(&reducer, &partial).expect("project");

    log.record(
        "s1",
        1,
        EventPayload::TurnCompleted {
            status: TurnStatus::Completed,
            fingerprint: expected.fingerprint(),
        },
    )
    .expect("record");
    let events = log.reader().replay("s1", 1).expect("replay");
    assert_eq!(project_turn(&reducer, &events).expect("project"), expected);

    let mut tampered = events.clone();
    if let EventPayload::TurnCompleted { fingerprint, .. } = &mut tampered[2].payload {
        *fingerprint = "0".repeat(64);
    }
    let err = project_turn(&reducer, &tampered).expect_err("tampered fingerprint");
    assert_eq!(err.kind, ProjectionErrorKind::FingerprintMismatch);
}

#[test]
fn given_gap_or_missing_start_when_projected_then_rejected() {
    let reducer = Reducer::default();
    let mut log = EventLog::in_memory();
    log.record("s1", 1, turn_started("hello")).expect("record");
    log.record("s1", 1, stage(TurnStage::Ingest)).expect("record");
    log.record("s1", 1, stage(TurnStage::Signals)).expect("record");
    let events = log.reader().replay("s1", 1).expect("replay");

    let gapped = vec![events[0].clone(), events[2].clone()];
    let err = project_turn(&reducer, &gapped).expect_err("gap");
    assert_eq!(err.kind, ProjectionErrorKind::Gap);

    let headless = events[1..].to_vec();
    let err = project_turn(&reducer, &headless).expect_err("missing start");
    assert_eq!(err.kind, ProjectionErrorKind::MissingTurnStart);
}

#[test]
fn given_two_turns_when_session_projected_then_baseline_carries_forward() {
    let reducer = Reducer::default();
    let mut log = EventLog::in_memory();
    log.record("s1", 1, turn_started("first")).expect("record");
    log.record("s1", 1, nudge(0.2)).expect("record");
    log.record("s1", 1, EventPayload::ModulatorsDecayed { elapsed_ms: 0 }).expect("record");

    let first = log.reader().replay("s1", 1).expect("replay");
    let after_first = project_turn(&reducer, &first).expect("project");
    log.record(
        "s1",
        2,
        EventPayload::TurnStarted {
            user_message: "second".to_string(),
            constraints: vec!["be brief".to_string()],
            baseline: after_first.baseline(),
        },
    )
    .expect("record");

    let session = log.reader().replay_session("s1").expect("replay");
    let workspace = project_session(&reducer, "s1", &session).expect("project");
    assert_eq!(workspace.turn_id, 2);
    assert_eq!(workspace.context.constraints, vec!["be brief".to_string()]);
    assert!((workspace.modulators.arousal - 0.5).abs() < 1e-12);

    let second = log.reader().replay("s1", 2).expect("replay");
    assert_eq!(project_turn(&reducer, &second).expect("project"), workspace);
}

#[test]
fn given_maintenance_prelude_when_projected_then_turn_start_still_anchors_the_turn() {
    let reducer = Reducer::default();
    let mut log = EventLog::in_memory();
    log.record("s1", 1, nudge(0.1)).expect("record");
    log.record("s1", 1, turn_started("hello")).expect("record");
    log.record("s1", 1, stage(TurnStage::Ingest)).expect("record");
    let events = log.reader().replay("s1", 1).expect("replay");

    let workspace = project_turn(&reducer, &events).expect("prelude is allowed");
    assert_eq!(workspace.turn_id, 1);
    assert_eq!(workspace.context.user_message, "hello");

    let prelude_only = events[..1].to_vec();
    assert!(project_turn(&reducer, &prelude_only).is_ok());
}

#[test]
fn given_turn_events_when_summarized_then_transcript_reflects_outcome() {
    let mut log = EventLog::in_memory();
    log.record("s1", 1, turn_started("hello")).expect("record");
    log.record("s1", 1, stage(TurnStage::Ingest)).expect("record");
    log.record("s1", 1, completed("empathy", "user says hello")).expect("record");
    log.record(
        "s1",
        1,
        EventPayload::WorkerFailed {
            round: 0,
            worker_id: "slow".to_string(),
            elapsed_ms: 50,
            failure: concord::worker::WorkerErrorKind::Timeout,
            error: "worker 'slow' exceeded 50ms".to_string(),
        },
    )
    .expect("record");
    log.record(
        "s1",
        1,
        EventPayload::ValidationCompleted {
            blocked: true,
            reasons: vec!["too blunt".to_string()],
            errors: Vec::new(),
        },
    )
    .expect("record");

    let events = log.reader().replay("s1", 1).expect("replay");
    let transcript = TurnTranscript::from_events(&events);
    assert_eq!(transcript.user_message, "hello");
    assert_eq!(transcript.stages, vec![TurnStage::Ingest]);
    assert_eq!(transcript.completed_workers, vec!["empathy".to_string()]);
    assert_eq!(transcript.failed_workers, vec!["slow".to_string()]);
    assert!(transcript.critic_blocked);
    assert_eq!(transcript.status, None);
}
