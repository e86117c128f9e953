use crate::{
    decision::types::{Decision, DecisionIntent, DecisionUrgency, TriageInput},
    workspace::ClaimType,
};

pub const STRAIN_RESPONSE_THRESHOLD: f64 = 0.6;

/// Rule-based triage: pure function of the ranked claims and workspace state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Triage;

impl Triage {
    pub fn decide(&self, input: &TriageInput<'_>) -> Decision {
        let claims = input.top_claims;
        let strain = input.modulators.strain;
        let claim_urgency = claims
            .iter()
            .map(|claim| claim.urgency)
            .fold(0.0_f64, f64::max);
        let proposal_urgency = if input.proposal_urgency.is_finite() {
            input.proposal_urgency.max(0.0)
        } else {
            0.0
        };
        let max_urgency = claim_urgency.max(proposal_urgency);
        let has_type = |claim_type: ClaimType| claims.iter().any(|claim| claim.claim_type == claim_type);
        let strained = strain > STRAIN_RESPONSE_THRESHOLD;

        let mut rationale = Vec::new();
        if has_type(ClaimType::Concern) {
            rationale.push("concern raised".to_string());
        }
        if has_type(ClaimType::Question) {
            rationale.push("open question".to_string());
        }
        if has_type(ClaimType::Recommendation) {
            rationale.push("recommendation available".to_string());
        }
        if claim_urgency >= 2.0 {
            rationale.push(format!("claim urgency {claim_urgency:.1}"));
        }
        if proposal_urgency >= 2.0 && proposal_urgency > claim_urgency {
            rationale.push(format!("worker urgency {proposal_urgency:.1}"));
        }
        if input.interrogative {
            rationale.push("user asked a question".to_string());
        }
        if strained {
            rationale.push(format!("strain {strain:.2}"));
        }
        let should_respond = !rationale.is_empty() || max_urgency > 0.0;
        if rationale.is_empty() && should_respond {
            rationale.push("positive urgency".to_string());
        }

        let urgency = if max_urgency >= 3.0 {
            DecisionUrgency::Critical
        } else if max_urgency >= 2.0 || strained {
            DecisionUrgency::High
        } else if max_urgency >= 1.0 || has_type(ClaimType::Concern) {
            DecisionUrgency::Medium
        } else {
            DecisionUrgency::Low
        };

        let intent = if !should_respond {
            rationale.push("nothing warrants a response".to_string());
            DecisionIntent::Hold
        } else {
            match claims.first().map(|claim| claim.claim_type) {
                Some(ClaimType::Concern) => DecisionIntent::Support,
                Some(ClaimType::Recommendation) => DecisionIntent::Advise,
                Some(ClaimType::Question) => DecisionIntent::Clarify,
                _ if input.interrogative => DecisionIntent::Answer,
                _ => DecisionIntent::Acknowledge,
            }
        };

        Decision {
            should_respond,
            urgency,
            intent,
            rationale,
            top_claim_ids: claims.iter().map(|claim| claim.id.clone()).collect(),
            safety_override: false,
        }
    }
}
