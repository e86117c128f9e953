use std::collections::BTreeSet;

use crate::{
    deliberation::{
        graph::ArgumentGraph,
        types::{ConsensusResult, DeliberationConfig, DeliberationPhase, DoneReason},
    },
    types::{ClaimId, WorkerId},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliberationStep {
    FollowUp {
        round: u32,
        workers: Vec<WorkerId>,
        contested: Vec<ClaimId>,
    },
    Done {
        reason: DoneReason,
        rounds: u32,
    },
}

/// Bounded follow-up state machine: seed, then at most `max_rounds - 1` follow-up rounds.
#[derive(Debug, Clone)]
pub struct Deliberator {
    config: DeliberationConfig,
    phase: DeliberationPhase,
    round: u32,
}

impl Deliberator {
    pub fn new(config: DeliberationConfig) -> Self {
        Self {
            config,
            phase: DeliberationPhase::Seed,
            round: 0,
        }
    }

    pub fn phase(&self) -> DeliberationPhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Decides the next step from the consensus of the round that just finished.
    pub fn evaluate(
        &mut self,
        graph: &ArgumentGraph,
        consensus: &ConsensusResult,
        available: &BTreeSet<WorkerId>,
    ) -> DeliberationStep {
        if let DeliberationPhase::Done { reason } = self.phase {
            return DeliberationStep::Done {
                reason,
                rounds: self.round,
            };
        }

        let (threshold, reason) = if self.round == 0 {
            (self.config.early_exit_score, DoneReason::EarlyConsensus)
        } else {
            (self.config.settle_score, DoneReason::Settled)
        };
        if consensus.overall_score >= threshold {
            return self.finish(reason);
        }
        if self.round.saturating_add(1) >= self.config.max_rounds {
            return self.finish(DoneReason::RoundLimit);
        }
        if consensus.contested_claims.is_empty() {
            return self.finish(DoneReason::NoContest);
        }

        let workers: Vec<WorkerId> = graph
            .follow_up_authors()
            .into_iter()
            .filter(|worker| available.contains(worker))
            .collect();
        if workers.is_empty() {
            return self.finish(DoneReason::NoFollowUpWorkers);
        }

        self.round += 1;
        self.phase = DeliberationPhase::FollowUp { round: self.round };
        tracing::debug!(
            target: "deliberation",
            round = self.round,
            score = consensus.overall_score,
            workers = ?workers,
            "deliberation_follow_up_requested"
        );
        DeliberationStep::FollowUp {
            round: self.round,
            workers,
            contested: consensus.contested_claims.clone(),
        }
    }

    fn finish(&mut self, reason: DoneReason) -> DeliberationStep {
        self.phase = DeliberationPhase::Done { reason };
        tracing::debug!(
            target: "deliberation",
            round = self.round,
            reason = ?reason,
            "deliberation_done"
        );
        DeliberationStep::Done {
            reason,
            rounds: self.round,
        }
    }
}
