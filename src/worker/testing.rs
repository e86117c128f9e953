use std::{future::Future, pin::Pin, sync::Arc};

use async_trait::async_trait;

use crate::worker::{
    error::WorkerError,
    ports::Assessor,
    types::{AssessmentContext, AssessorOutput},
};

pub type AssessorFuture = Pin<Box<dyn Future<Output = Result<AssessorOutput, WorkerError>> + Send>>;
pub type AssessorHook = Arc<dyn Fn(AssessmentContext) -> AssessorFuture + Send + Sync>;

/// Assessor backed by an async closure, for tests and embedders.
#[derive(Clone)]
pub struct HookAssessor {
    hook: AssessorHook,
}

impl HookAssessor {
    pub fn new<F, Fut>(hook: F) -> Self
    where
        F: Fn(AssessmentContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<AssessorOutput, WorkerError>> + Send + 'static,
    {
        Self {
            hook: Arc::new(move |ctx: AssessmentContext| -> AssessorFuture { Box::pin(hook(ctx)) }),
        }
    }

    pub fn into_arc(self) -> Arc<dyn Assessor> {
        Arc::new(self)
    }
}

#[async_trait]
impl Assessor for HookAssessor {
    async fn assess(&self, ctx: AssessmentContext) -> Result<AssessorOutput, WorkerError> {
        (self.hook)(ctx).await
    }
}
