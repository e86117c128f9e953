use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    types::{ClaimId, SessionId, TurnId, WorkerId},
    workspace::types::{
        Claim, ClaimType, GlobalModulators, RetrievedContext, StanceVector, TurnContext,
        WorkspaceBaseline,
    },
};

/// Shared blackboard for one session. Only the reducer writes to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub session_id: SessionId,
    pub turn_id: TurnId,
    pub stance: StanceVector,
    pub stance_anchor: StanceVector,
    pub modulators: GlobalModulators,
    pub active_claims: Vec<Claim>,
    pub claim_aliases: BTreeMap<ClaimId, ClaimId>,
    /// Latest proposal-level urgency of each worker this turn.
    #[serde(default)]
    pub proposal_urgency: BTreeMap<WorkerId, f64>,
    pub context: TurnContext,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(SessionId::new())
    }
}

impl Workspace {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            turn_id: 0,
            stance: StanceVector::default(),
            stance_anchor: StanceVector::default(),
            modulators: GlobalModulators::default(),
            active_claims: Vec::new(),
            claim_aliases: BTreeMap::new(),
            proposal_urgency: BTreeMap::new(),
            context: TurnContext::default(),
        }
    }

    pub fn baseline(&self) -> WorkspaceBaseline {
        WorkspaceBaseline {
            stance: self.stance.clone(),
            modulators: self.modulators.clone(),
        }
    }

    pub fn restore_baseline(&mut self, baseline: &WorkspaceBaseline) {
        self.stance = baseline.stance.clone();
        self.modulators = baseline.modulators.clone();
    }

    /// Drops turn-scoped state and anchors the stance bound at the current values.
    pub fn begin_turn(&mut self, turn_id: TurnId, user_message: &str, constraints: &[String]) {
        self.turn_id = turn_id;
        self.stance_anchor = self.stance.clone();
        self.active_claims.clear();
        self.claim_aliases.clear();
        self.proposal_urgency.clear();
        self.context = TurnContext {
            user_message: user_message.to_string(),
            constraints: constraints.to_vec(),
            ..TurnContext::default()
        };
    }

    pub fn set_retrieved(&mut self, retrieved: RetrievedContext) {
        for thread in &retrieved.open_threads {
            if !self.context.open_threads.contains(thread) {
                self.context.open_threads.push(thread.clone());
            }
        }
        self.context.retrieved = retrieved;
    }

    /// Highest urgency any worker reported for the turn as a whole.
    pub fn peak_proposal_urgency(&self) -> f64 {
        self.proposal_urgency.values().copied().fold(0.0, f64::max)
    }

    pub fn resolve_claim_id<'a>(&'a self, id: &'a str) -> &'a str {
        self.claim_aliases.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn claim(&self, id: &str) -> Option<&Claim> {
        let resolved = self.resolve_claim_id(id);
        self.active_claims.iter().find(|claim| claim.id == resolved)
    }

    pub fn claims_of_type(&self, claim_type: ClaimType) -> impl Iterator<Item = &Claim> {
        self.active_claims
            .iter()
            .filter(move |claim| claim.claim_type == claim_type)
    }

    pub fn claims_by(&self, worker_id: &WorkerId) -> impl Iterator<Item = &Claim> {
        self.active_claims
            .iter()
            .filter(move |claim| claim.contributors.contains(worker_id))
    }

    /// SHA-256 over the canonical JSON rendering.
    pub fn fingerprint(&self) -> String {
        let encoded = match serde_json::to_vec(self) {
            Ok(bytes) => bytes,
            // Unreachable for this shape; keep a stable marker rather than panic.
            Err(err) => format!("unencodable:{err}").into_bytes(),
        };
        hex_digest(&encoded)
    }
}

pub(crate) fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
