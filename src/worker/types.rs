use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    types::{ClaimId, SessionId, TurnId, WorkerId},
    workspace::{
        Claim, ClaimAssertion, ClaimType, GlobalModulators, PatchValue, StanceDimension, StanceVector,
        TurnContext, Workspace, derive_claim_id,
    },
};

/// Claim as emitted by a worker, before ids and provenance are assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct ClaimDraft {
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
    #[serde(rename = "type")]
    pub claim_type: ClaimType,
    #[validate(range(min = 0.0, max = 3.0))]
    pub urgency: f64,
    #[validate(range(min = 0.0, max = 3.0))]
    pub confidence: f64,
    #[serde(default)]
    pub supports: Vec<ClaimId>,
    #[serde(default)]
    pub opposes: Vec<ClaimId>,
}

/// Wire shape of a worker's structured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProposalDraft {
    #[serde(default)]
    #[validate(length(max = 4000))]
    pub observation: String,
    #[validate(range(min = 0.0, max = 3.0))]
    pub urgency: f64,
    #[validate(range(min = 0.0, max = 3.0))]
    pub confidence: f64,
    #[serde(default)]
    #[validate(length(max = 32), nested)]
    pub claims: Vec<ClaimDraft>,
    #[serde(default)]
    pub stance_delta: BTreeMap<StanceDimension, f64>,
    #[serde(default)]
    pub workspace_patch: BTreeMap<String, PatchValue>,
}

/// Validated worker output, consumed once by the reducer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub worker_id: WorkerId,
    pub observation: String,
    pub urgency: f64,
    pub confidence: f64,
    pub claims: Vec<Claim>,
    #[serde(default)]
    pub stance_delta: BTreeMap<StanceDimension, f64>,
    #[serde(default)]
    pub workspace_patch: BTreeMap<String, PatchValue>,
}

impl Proposal {
    pub fn neutral(worker_id: impl Into<WorkerId>) -> Self {
        Self {
            worker_id: worker_id.into(),
            observation: String::new(),
            urgency: 0.0,
            confidence: 0.0,
            claims: Vec::new(),
            stance_delta: BTreeMap::new(),
            workspace_patch: BTreeMap::new(),
        }
    }

    pub fn from_draft(worker_id: impl Into<WorkerId>, draft: ProposalDraft) -> Self {
        let worker_id = worker_id.into();
        let claims = draft
            .claims
            .into_iter()
            .map(|claim| {
                let text = claim.text.trim().to_string();
                Claim {
                    id: claim
                        .id
                        .unwrap_or_else(|| derive_claim_id(claim.claim_type, &text)),
                    text,
                    claim_type: claim.claim_type,
                    source: worker_id.clone(),
                    urgency: claim.urgency,
                    confidence: claim.confidence,
                    supports: claim.supports,
                    opposes: claim.opposes,
                    contributors: BTreeSet::from([worker_id.clone()]),
                    assertions: BTreeMap::from([(
                        worker_id.clone(),
                        ClaimAssertion {
                            urgency: claim.urgency,
                            confidence: claim.confidence,
                        },
                    )]),
                }
            })
            .collect();

        Self {
            worker_id,
            observation: draft.observation,
            urgency: draft.urgency,
            confidence: draft.confidence,
            claims,
            stance_delta: draft.stance_delta,
            workspace_patch: draft.workspace_patch,
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.claims.is_empty()
            && self.stance_delta.is_empty()
            && self.workspace_patch.is_empty()
            && self.urgency == 0.0
            && self.confidence == 0.0
    }
}

/// Read-only snapshot handed to assessors and renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentContext {
    pub session_id: SessionId,
    pub turn_id: TurnId,
    pub round: u32,
    #[serde(default)]
    pub worker_id: Option<WorkerId>,
    pub user_message: String,
    pub stance: StanceVector,
    pub modulators: GlobalModulators,
    pub context: TurnContext,
    pub active_claims: Vec<Claim>,
    #[serde(default)]
    pub contested_claims: Vec<ClaimId>,
    #[serde(default)]
    pub signal_levels: BTreeMap<String, f64>,
}

impl AssessmentContext {
    pub fn from_workspace(
        workspace: &Workspace,
        round: u32,
        contested_claims: Vec<ClaimId>,
        signal_levels: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            session_id: workspace.session_id.clone(),
            turn_id: workspace.turn_id,
            round,
            worker_id: None,
            user_message: workspace.context.user_message.clone(),
            stance: workspace.stance.clone(),
            modulators: workspace.modulators.clone(),
            context: workspace.context.clone(),
            active_claims: workspace.active_claims.clone(),
            contested_claims,
            signal_levels,
        }
    }

    pub fn for_worker(&self, worker_id: &str) -> Self {
        Self {
            worker_id: Some(worker_id.to_string()),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssessorOutput {
    Structured(ProposalDraft),
    Raw(String),
}
