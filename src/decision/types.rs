use serde::{Deserialize, Serialize};

use crate::{
    types::ClaimId,
    workspace::{Claim, GlobalModulators},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionUrgency {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionIntent {
    Protect,
    Support,
    Advise,
    Clarify,
    Answer,
    Acknowledge,
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub should_respond: bool,
    pub urgency: DecisionUrgency,
    pub intent: DecisionIntent,
    pub rationale: Vec<String>,
    pub top_claim_ids: Vec<ClaimId>,
    #[serde(default)]
    pub safety_override: bool,
}

impl Decision {
    /// Fixed decision taken on a safety interrupt.
    pub fn protective(reason: impl Into<String>) -> Self {
        Self {
            should_respond: true,
            urgency: DecisionUrgency::Critical,
            intent: DecisionIntent::Protect,
            rationale: vec![reason.into()],
            top_claim_ids: Vec::new(),
            safety_override: true,
        }
    }
}

/// Everything triage looks at: ranked claims plus the bits of workspace state it needs.
#[derive(Debug, Clone, Copy)]
pub struct TriageInput<'a> {
    pub top_claims: &'a [Claim],
    pub modulators: &'a GlobalModulators,
    pub interrogative: bool,
    /// Peak proposal-level urgency reported by the turn's workers.
    pub proposal_urgency: f64,
}
