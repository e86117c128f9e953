use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{types::ClaimId, workspace::ClaimType};

fn default_max_rounds() -> u32 {
    3
}

fn default_early_exit_score() -> f64 {
    0.9
}

fn default_settle_score() -> f64 {
    0.7
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationConfig {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default = "default_early_exit_score")]
    pub early_exit_score: f64,
    #[serde(default = "default_settle_score")]
    pub settle_score: f64,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for DeliberationConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            early_exit_score: default_early_exit_score(),
            settle_score: default_settle_score(),
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedClaim {
    pub claim_id: ClaimId,
    pub claim_type: ClaimType,
    pub score: f64,
    pub urgency: f64,
    pub confidence: f64,
    pub opposition: f64,
    pub support: f64,
}

/// Derived each round, never stored on the workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub overall_score: f64,
    pub per_type_scores: BTreeMap<ClaimType, f64>,
    pub top_claims: Vec<RankedClaim>,
    pub contested_claims: Vec<ClaimId>,
    pub resolved_claims: Vec<ClaimId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoneReason {
    EarlyConsensus,
    Settled,
    NoContest,
    NoFollowUpWorkers,
    RoundLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DeliberationPhase {
    Seed,
    FollowUp { round: u32 },
    Done { reason: DoneReason },
}
