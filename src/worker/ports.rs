use async_trait::async_trait;

use crate::worker::{
    error::WorkerError,
    types::{AssessmentContext, AssessorOutput},
};

/// An isolated worker. Implementations must tolerate being dropped mid-flight on timeout.
#[async_trait]
pub trait Assessor: Send + Sync {
    async fn assess(&self, ctx: AssessmentContext) -> Result<AssessorOutput, WorkerError>;
}
