use async_trait::async_trait;

use crate::{
    decision::Decision,
    orchestrator::{
        error::CollaboratorError,
        types::{CriticVerdict, TurnRecord},
    },
    worker::AssessmentContext,
    workspace::{RetrievedContext, TurnContext},
};

#[async_trait]
pub trait MemoryRetriever: Send + Sync {
    async fn retrieve(
        &self,
        query: &str,
        context: &TurnContext,
    ) -> Result<RetrievedContext, CollaboratorError>;
}

#[async_trait]
pub trait ResponseRenderer: Send + Sync {
    async fn render(
        &self,
        decision: &Decision,
        context: &AssessmentContext,
    ) -> Result<String, CollaboratorError>;
}

#[async_trait]
pub trait Critic: Send + Sync {
    fn name(&self) -> &str;

    async fn review(
        &self,
        decision: &Decision,
        response: Option<&str>,
        context: &AssessmentContext,
    ) -> Result<CriticVerdict, CollaboratorError>;
}

#[async_trait]
pub trait MemoryCommitter: Send + Sync {
    async fn commit(&self, record: &TurnRecord) -> Result<(), CollaboratorError>;
}
