use std::collections::BTreeMap;

use concord::{
    decision::{DecisionIntent, DecisionUrgency},
    event_log::{EventKind, EventLog, EventPayload, TurnTranscript, project_session, project_turn},
    orchestrator::{TurnError, TurnInput, TurnOrchestrator, TurnStage, TurnStatus},
    scheduler::{PriorityTier, WorkerDescriptor},
    worker::{AssessorOutput, HookAssessor, ProposalDraft},
    workspace::{ModulatorKind, Reducer},
};
use tokio_stream::StreamExt;

use crate::{empathy_worker, kinds, orchestrator, registry, replay, settings, shared_log};

#[tokio::test]
async fn given_single_worker_when_turn_runs_then_stages_are_logged_in_order() {
    let mut orchestrator = orchestrator(vec![empathy_worker()]);

    let outcome = orchestrator
        .run_turn(TurnInput::new("I am so tired of this week"))
        .await
        .expect("turn should complete");

    assert_eq!(outcome.turn_id, 1);
    assert_eq!(outcome.status, TurnStatus::Completed);
    assert!(outcome.decision.should_respond);
    assert_eq!(
        outcome.response.as_deref(),
        Some("That sounds hard. the user sounds worn out")
    );

    let events = replay(&orchestrator, 1);
    for (expected, event) in events.iter().enumerate() {
        assert_eq!(event.seq, expected as u64);
    }
    let kinds = kinds(&events);
    assert_eq!(kinds.first(), Some(&EventKind::TurnStarted));
    assert_eq!(kinds.last(), Some(&EventKind::TurnCompleted));
    for required in [
        EventKind::WorkerStarted,
        EventKind::WorkerCompleted,
        EventKind::WorkspacePatched,
        EventKind::ConsensusUpdated,
        EventKind::DecisionMade,
    ] {
        assert!(kinds.contains(&required), "missing {required:?}");
    }

    let transcript = TurnTranscript::from_events(&events);
    assert_eq!(
        transcript.stages,
        vec![
            TurnStage::Ingest,
            TurnStage::Signals,
            TurnStage::Retrieval,
            TurnStage::Waves,
            TurnStage::Deliberation,
            TurnStage::Decision,
            TurnStage::Response,
            TurnStage::Validation,
            TurnStage::Commit,
            TurnStage::Completed,
        ]
    );
    assert_eq!(transcript.completed_workers, vec!["empathy".to_string()]);
    assert_eq!(transcript.status, Some(TurnStatus::Completed));
}

#[tokio::test]
async fn given_completed_turn_when_replayed_then_workspace_matches_live_state() {
    let mut orchestrator = orchestrator(vec![empathy_worker()]);
    let outcome = orchestrator
        .run_turn(TurnInput::new("WHY IS EVERYTHING BREAKING!!"))
        .await
        .expect("turn should complete");

    let events = replay(&orchestrator, 1);
    let replayed = project_turn(&Reducer::default(), &events).expect("projection should succeed");

    assert_eq!(&replayed, orchestrator.workspace());
    assert_eq!(replayed.fingerprint(), outcome.fingerprint);
    assert!(
        events
            .iter()
            .any(|event| event.kind() == EventKind::ModulatorNudged),
        "emphatic input should nudge arousal through the log"
    );
}

#[tokio::test]
async fn given_subscriber_when_turn_runs_then_live_stream_equals_replay() {
    let mut orchestrator = orchestrator(vec![empathy_worker()]);
    let live = orchestrator.subscribe();

    orchestrator
        .run_turn(TurnInput::new("long day again"))
        .await
        .expect("turn should complete");

    let stored = replay(&orchestrator, 1);
    let observed: Vec<_> = live.take(stored.len()).collect().await;
    assert_eq!(observed, stored);
}

#[tokio::test]
async fn given_blank_message_when_turn_runs_then_input_is_rejected_without_events() {
    let mut orchestrator = orchestrator(vec![empathy_worker()]);

    let err = orchestrator
        .run_turn(TurnInput::new("   "))
        .await
        .expect_err("blank input must fail");

    assert!(matches!(err, TurnError::InvalidInput(_)));
    assert_eq!(orchestrator.last_turn_id(), 0);
    assert!(replay(&orchestrator, 1).is_empty());
}

#[tokio::test]
async fn given_nudged_modulator_when_maintenance_ticks_then_it_decays_toward_baseline() {
    let mut orchestrator = orchestrator(Vec::new());
    let baseline = ModulatorKind::Arousal.baseline();

    orchestrator
        .nudge(ModulatorKind::Arousal, 0.2)
        .expect("nudge should log");
    let nudged = orchestrator.workspace().modulators.arousal;
    assert!((nudged - (baseline + 0.2)).abs() < 1e-9);

    orchestrator
        .maintenance_tick(10 * 60 * 1000)
        .expect("tick should log");
    let decayed = orchestrator.workspace().modulators.arousal;
    assert!((decayed - (baseline + 0.1)).abs() < 1e-9);

    // Maintenance before any turn opens turn 1 without starting it.
    assert_eq!(orchestrator.last_turn_id(), 0);
    let events = replay(&orchestrator, 1);
    assert_eq!(
        kinds(&events),
        vec![EventKind::ModulatorNudged, EventKind::ModulatorsDecayed]
    );
    assert!(matches!(
        events[1].payload,
        EventPayload::ModulatorsDecayed { elapsed_ms: 600_000 }
    ));
}

#[tokio::test]
async fn given_maintenance_between_turns_when_next_turn_runs_then_it_is_that_turns_prelude() {
    let mut orchestrator = orchestrator(vec![empathy_worker()]);
    orchestrator
        .run_turn(TurnInput::new("long week"))
        .await
        .expect("first turn should complete");
    orchestrator
        .nudge(ModulatorKind::Strain, 0.1)
        .expect("nudge should log");
    orchestrator
        .maintenance_tick(30_000)
        .expect("tick should log");

    let first = replay(&orchestrator, 1);
    assert_eq!(kinds(&first).last(), Some(&EventKind::TurnCompleted));

    let outcome = orchestrator
        .run_turn(TurnInput::new("still going"))
        .await
        .expect("second turn should complete");
    assert_eq!(outcome.turn_id, 2);

    let second = replay(&orchestrator, 2);
    let kinds = kinds(&second);
    assert_eq!(
        kinds[..3],
        [
            EventKind::ModulatorNudged,
            EventKind::ModulatorsDecayed,
            EventKind::TurnStarted
        ]
    );
    assert_eq!(kinds.last(), Some(&EventKind::TurnCompleted));

    let transcript = TurnTranscript::from_events(&second);
    assert_eq!(transcript.stages.first(), Some(&TurnStage::Ingest));
    assert_eq!(transcript.status, Some(TurnStatus::Completed));

    let replayed = project_turn(&Reducer::default(), &second).expect("projection should succeed");
    assert_eq!(&replayed, orchestrator.workspace());
    assert_eq!(replayed.fingerprint(), outcome.fingerprint);
}

#[tokio::test]
async fn given_trailing_maintenance_when_restored_then_pending_turn_is_resumed() {
    let (store, log) = shared_log();
    let mut first =
        TurnOrchestrator::new("session-1", registry(vec![empathy_worker()]), log, settings());
    first
        .run_turn(TurnInput::new("rough morning"))
        .await
        .expect("turn should complete");
    first.maintenance_tick(5_000).expect("tick should log");
    drop(first);

    let mut second = TurnOrchestrator::new(
        "session-1",
        registry(vec![empathy_worker()]),
        EventLog::new(store),
        settings(),
    );
    second.restore().expect("restore should succeed");
    assert_eq!(second.last_turn_id(), 1);

    let outcome = second
        .run_turn(TurnInput::new("rough afternoon"))
        .await
        .expect("resumed turn should complete");
    assert_eq!(outcome.turn_id, 2);

    let resumed = replay(&second, 2);
    assert_eq!(resumed[0].kind(), EventKind::ModulatorsDecayed);
    assert_eq!(resumed[1].kind(), EventKind::TurnStarted);
    assert_eq!(resumed[1].seq, 1);
}

#[tokio::test]
async fn given_shared_store_when_new_orchestrator_restores_then_turn_ids_resume() {
    let (store, log) = shared_log();
    let mut first =
        TurnOrchestrator::new("session-1", registry(vec![empathy_worker()]), log, settings());
    first
        .run_turn(TurnInput::new("rough morning"))
        .await
        .expect("first turn should complete");
    first.maintenance_tick(5_000).expect("tick should log");
    first
        .run_turn(TurnInput::new("rough afternoon too"))
        .await
        .expect("second turn should complete");

    let mut second = TurnOrchestrator::new(
        "session-1",
        registry(vec![empathy_worker()]),
        EventLog::new(store),
        settings(),
    );
    second.restore().expect("restore should succeed");

    assert_eq!(second.last_turn_id(), 2);
    assert_eq!(second.workspace(), first.workspace());

    let outcome = second
        .run_turn(TurnInput::new("and now the evening"))
        .await
        .expect("resumed turn should complete");
    assert_eq!(outcome.turn_id, 3);

    let session = second
        .event_reader()
        .replay_session("session-1")
        .expect("session should replay");
    let projected =
        project_session(second.reducer(), "session-1", &session).expect("session should project");
    assert_eq!(&projected, second.workspace());
}

#[tokio::test]
async fn given_empty_store_when_restoring_then_nothing_changes() {
    let mut orchestrator =
        TurnOrchestrator::new("fresh", registry(Vec::new()), EventLog::in_memory(), settings());

    orchestrator.restore().expect("empty restore should succeed");

    assert_eq!(orchestrator.last_turn_id(), 0);
    assert!(orchestrator.workspace().active_claims.is_empty());
}

#[tokio::test]
async fn given_urgent_worker_without_claims_when_turn_runs_then_triage_responds() {
    let alarm = HookAssessor::new(|_ctx| async {
        Ok(AssessorOutput::Structured(ProposalDraft {
            observation: "something feels off".to_string(),
            urgency: 3.0,
            confidence: 3.0,
            claims: Vec::new(),
            stance_delta: BTreeMap::new(),
            workspace_patch: BTreeMap::new(),
        }))
    });
    let mut orchestrator = orchestrator(vec![(
        WorkerDescriptor::new("alarm", PriorityTier::AlwaysOn),
        alarm,
    )]);

    let outcome = orchestrator
        .run_turn(TurnInput::new("fine, whatever"))
        .await
        .expect("turn should complete");

    assert!(outcome.decision.should_respond);
    assert_eq!(outcome.decision.urgency, DecisionUrgency::Critical);
    assert_eq!(outcome.decision.intent, DecisionIntent::Acknowledge);
    assert_eq!(orchestrator.workspace().peak_proposal_urgency(), 3.0);

    let replayed = project_turn(&Reducer::default(), &replay(&orchestrator, 1))
        .expect("projection should succeed");
    assert_eq!(&replayed, orchestrator.workspace());
}
