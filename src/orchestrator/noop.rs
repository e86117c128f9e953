use async_trait::async_trait;

use crate::{
    decision::{Decision, DecisionIntent},
    orchestrator::{
        error::CollaboratorError,
        ports::{Critic, MemoryCommitter, MemoryRetriever, ResponseRenderer},
        types::{CriticVerdict, TurnRecord},
    },
    worker::AssessmentContext,
    workspace::{RetrievedContext, TurnContext},
};

#[derive(Debug, Clone, Default)]
pub struct NoopMemoryRetriever;

#[async_trait]
impl MemoryRetriever for NoopMemoryRetriever {
    async fn retrieve(
        &self,
        _query: &str,
        _context: &TurnContext,
    ) -> Result<RetrievedContext, CollaboratorError> {
        Ok(RetrievedContext::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoopCritic;

#[async_trait]
impl Critic for NoopCritic {
    fn name(&self) -> &str {
        "noop"
    }

    async fn review(
        &self,
        _decision: &Decision,
        _response: Option<&str>,
        _context: &AssessmentContext,
    ) -> Result<CriticVerdict, CollaboratorError> {
        Ok(CriticVerdict::pass())
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoopMemoryCommitter;

#[async_trait]
impl MemoryCommitter for NoopMemoryCommitter {
    async fn commit(&self, _record: &TurnRecord) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

/// Renders a plain sentence from the decision and the top claim, without any generator.
#[derive(Debug, Clone, Default)]
pub struct TemplateRenderer;

#[async_trait]
impl ResponseRenderer for TemplateRenderer {
    async fn render(
        &self,
        decision: &Decision,
        context: &AssessmentContext,
    ) -> Result<String, CollaboratorError> {
        let lead = decision
            .top_claim_ids
            .first()
            .and_then(|id| context.active_claims.iter().find(|claim| &claim.id == id))
            .map(|claim| claim.text.as_str());
        let opener = match decision.intent {
            DecisionIntent::Protect => "Your safety comes first.",
            DecisionIntent::Support => "That sounds hard.",
            DecisionIntent::Advise => "Here is a suggestion.",
            DecisionIntent::Clarify => "Can you tell me a bit more?",
            DecisionIntent::Answer => "Good question.",
            DecisionIntent::Acknowledge => "Got it.",
            DecisionIntent::Hold => "",
        };
        Ok(match lead {
            Some(text) => format!("{opener} {text}").trim().to_string(),
            None => opener.to_string(),
        })
    }
}
