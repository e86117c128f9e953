use std::collections::BTreeMap;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::{
    worker::{
        error::{WorkerError, failure},
        ports::Assessor,
        types::{AssessmentContext, AssessorOutput, ClaimDraft, ProposalDraft},
    },
    workspace::{ClaimType, StanceDimension},
};

fn default_rule_score() -> f64 {
    1.0
}

/// One pattern-to-claim rule, loaded from `workers[].rules`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessorRule {
    pub pattern: String,
    #[serde(rename = "type")]
    pub claim_type: ClaimType,
    pub text: String,
    #[serde(default = "default_rule_score")]
    pub urgency: f64,
    #[serde(default = "default_rule_score")]
    pub confidence: f64,
    #[serde(default)]
    pub stance_delta: BTreeMap<StanceDimension, f64>,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    matcher: Regex,
    rule: AssessorRule,
}

/// Deterministic assessor that emits a claim for every rule matching the user message.
#[derive(Debug, Clone)]
pub struct RuleAssessor {
    rules: Vec<CompiledRule>,
}

impl RuleAssessor {
    pub fn new(rules: Vec<AssessorRule>) -> Result<Self, WorkerError> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let matcher = RegexBuilder::new(&rule.pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|err| {
                        failure(format!("invalid rule pattern '{}': {err}", rule.pattern))
                    })?;
                Ok(CompiledRule { matcher, rule })
            })
            .collect::<Result<Vec<_>, WorkerError>>()?;
        Ok(Self { rules })
    }

    pub fn draft_for(&self, message: &str) -> ProposalDraft {
        let matched: Vec<&AssessorRule> = self
            .rules
            .iter()
            .filter(|compiled| compiled.matcher.is_match(message))
            .map(|compiled| &compiled.rule)
            .collect();

        let mut stance_delta = BTreeMap::new();
        for rule in &matched {
            for (&dimension, &delta) in &rule.stance_delta {
                *stance_delta.entry(dimension).or_insert(0.0) += delta;
            }
        }

        ProposalDraft {
            observation: format!("{} rule(s) matched", matched.len()),
            urgency: matched.iter().map(|rule| rule.urgency).fold(0.0, f64::max),
            confidence: matched.iter().map(|rule| rule.confidence).fold(0.0, f64::max),
            claims: matched
                .iter()
                .map(|rule| ClaimDraft {
                    id: None,
                    text: rule.text.clone(),
                    claim_type: rule.claim_type,
                    urgency: rule.urgency,
                    confidence: rule.confidence,
                    supports: Vec::new(),
                    opposes: Vec::new(),
                })
                .collect(),
            stance_delta,
            workspace_patch: BTreeMap::new(),
        }
    }
}

#[async_trait]
impl Assessor for RuleAssessor {
    async fn assess(&self, ctx: AssessmentContext) -> Result<AssessorOutput, WorkerError> {
        Ok(AssessorOutput::Structured(self.draft_for(&ctx.user_message)))
    }
}
