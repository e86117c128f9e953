use std::time::Duration;

use concord::{
    deliberation::DoneReason,
    event_log::EventPayload,
    orchestrator::{TurnInput, TurnStatus},
    scheduler::{PriorityTier, WorkerDescriptor},
    worker::{AssessmentContext, HookAssessor, WorkerErrorKind},
    workspace::ClaimType,
};

use crate::{draft, fixed_worker, orchestrator, output, replay};

fn budget_worker(first: &'static str, later: &'static str) -> HookAssessor {
    HookAssessor::new(move |ctx: AssessmentContext| async move {
        let text = if ctx.round == 0 { first } else { later };
        Ok(output(vec![draft(ClaimType::Recommendation, text, 3.0, 3.0)]))
    })
}

#[tokio::test]
async fn given_opposed_recommendations_when_authors_agree_in_follow_up_then_deliberation_settles() {
    let mut orchestrator = orchestrator(vec![
        (
            WorkerDescriptor::new("planner", PriorityTier::Normal),
            budget_worker("we should increase the budget", "we should increase the budget"),
        ),
        (
            WorkerDescriptor::new("skeptic", PriorityTier::Normal),
            budget_worker("we should decrease the budget", "we should increase the budget"),
        ),
    ]);

    let outcome = orchestrator
        .run_turn(TurnInput::new("how should we handle the budget?"))
        .await
        .expect("turn should complete");

    assert_eq!(outcome.status, TurnStatus::Completed);
    assert_eq!(outcome.done_reason, Some(DoneReason::Settled));
    assert!(outcome.follow_up_rounds <= 2);
    let consensus = outcome.consensus.expect("deliberation should report consensus");
    assert!(consensus.overall_score >= 0.9);

    let events = replay(&orchestrator, 1);
    let seed_score = events
        .iter()
        .find_map(|event| match &event.payload {
            EventPayload::ConsensusUpdated { round: 0, consensus } => Some(consensus.overall_score),
            _ => None,
        })
        .expect("seed consensus should be logged");
    assert!(seed_score < 0.7, "seed score was {seed_score}");

    let follow_up_workers: Vec<&str> = events
        .iter()
        .filter_map(|event| match &event.payload {
            EventPayload::WorkerStarted { round: 1, worker_id, .. } => Some(worker_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(follow_up_workers, vec!["planner", "skeptic"]);

    let claims = &orchestrator.workspace().active_claims;
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].text, "we should increase the budget");
    assert_eq!(claims[0].contributors.len(), 2);
}

#[tokio::test]
async fn given_authors_that_never_agree_when_deliberating_then_round_limit_ends_it() {
    let mut orchestrator = orchestrator(vec![
        (
            WorkerDescriptor::new("planner", PriorityTier::Normal),
            budget_worker("we should increase the budget", "we should increase the budget"),
        ),
        (
            WorkerDescriptor::new("skeptic", PriorityTier::Normal),
            budget_worker("we should decrease the budget", "we should decrease the budget"),
        ),
    ]);

    let outcome = orchestrator
        .run_turn(TurnInput::new("the budget needs a call"))
        .await
        .expect("turn should complete");

    assert_eq!(outcome.done_reason, Some(DoneReason::RoundLimit));
    assert_eq!(outcome.follow_up_rounds, 2);
    assert!(outcome.decision.should_respond);
}

#[tokio::test]
async fn given_worker_exceeding_timeout_when_turn_runs_then_failure_is_logged_and_turn_completes() {
    let mut orchestrator = orchestrator(vec![
        (
            WorkerDescriptor::new("sleepy", PriorityTier::Normal).with_timeout_ms(30),
            HookAssessor::new(|_ctx| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(output(Vec::new()))
            }),
        ),
        (
            WorkerDescriptor::new("steady", PriorityTier::Normal),
            fixed_worker(ClaimType::Observation, "the user mentions a deadline", 1.0),
        ),
    ]);

    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        orchestrator.run_turn(TurnInput::new("the deadline is friday")),
    )
    .await
    .expect("turn must not wait for the slow worker")
    .expect("turn should complete");

    assert_eq!(outcome.status, TurnStatus::Completed);
    assert_eq!(outcome.failed_workers, vec!["sleepy".to_string()]);
    assert_eq!(outcome.done_reason, Some(DoneReason::EarlyConsensus));

    let events = replay(&orchestrator, 1);
    let failure = events
        .iter()
        .find_map(|event| match &event.payload {
            EventPayload::WorkerFailed { worker_id, failure, .. } => Some((worker_id.clone(), *failure)),
            _ => None,
        })
        .expect("worker failure should be logged");
    assert_eq!(failure, ("sleepy".to_string(), WorkerErrorKind::Timeout));
    assert!(
        orchestrator
            .workspace()
            .active_claims
            .iter()
            .all(|claim| !claim.contributors.contains("sleepy"))
    );
}
