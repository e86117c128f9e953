use std::{
    collections::BTreeMap,
    sync::Arc,
    time::{Duration, Instant},
};

use futures_util::future::join_all;

use crate::{
    scheduler::WorkerDescriptor,
    types::WorkerId,
    worker::{
        decode::decode_output,
        error::{WorkerError, failure, panicked, timeout},
        ports::Assessor,
        types::{AssessmentContext, Proposal},
    },
};

#[derive(Clone)]
pub struct RegisteredWorker {
    pub descriptor: WorkerDescriptor,
    pub assessor: Arc<dyn Assessor>,
}

/// Explicit worker collection, injected into both scheduler and executor.
#[derive(Clone, Default)]
pub struct WorkerRegistry {
    workers: BTreeMap<WorkerId, RegisteredWorker>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        descriptor: WorkerDescriptor,
        assessor: Arc<dyn Assessor>,
    ) -> Result<(), WorkerError> {
        if self.workers.contains_key(&descriptor.id) {
            return Err(failure(format!(
                "worker '{}' is already registered",
                descriptor.id
            )));
        }
        self.workers.insert(
            descriptor.id.clone(),
            RegisteredWorker {
                descriptor,
                assessor,
            },
        );
        Ok(())
    }

    pub fn with(
        mut self,
        descriptor: WorkerDescriptor,
        assessor: Arc<dyn Assessor>,
    ) -> Result<Self, WorkerError> {
        self.register(descriptor, assessor)?;
        Ok(self)
    }

    pub fn get(&self, worker_id: &str) -> Option<&RegisteredWorker> {
        self.workers.get(worker_id)
    }

    pub fn descriptors(&self) -> Vec<WorkerDescriptor> {
        self.workers
            .values()
            .map(|worker| worker.descriptor.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerOutcome {
    pub worker_id: WorkerId,
    pub elapsed_ms: u64,
    pub result: Result<Proposal, WorkerError>,
}

impl WorkerOutcome {
    /// The proposal this worker contributes; neutral when it failed.
    pub fn proposal(&self) -> Proposal {
        match &self.result {
            Ok(proposal) => proposal.clone(),
            Err(_) => Proposal::neutral(self.worker_id.clone()),
        }
    }
}

/// Fork-join runner for one wave. Never touches the workspace.
#[derive(Clone)]
pub struct WorkerExecutor {
    registry: Arc<WorkerRegistry>,
    default_timeout: Duration,
}

impl WorkerExecutor {
    pub fn new(registry: Arc<WorkerRegistry>, default_timeout: Duration) -> Self {
        Self {
            registry,
            default_timeout,
        }
    }

    /// Runs every worker concurrently and returns outcomes in wave order.
    #[tracing::instrument(name = "run_wave", target = "executor", skip(self, ctx), fields(round = ctx.round))]
    pub async fn run_wave(&self, workers: &[WorkerId], ctx: &AssessmentContext) -> Vec<WorkerOutcome> {
        let tasks = workers.iter().map(|worker_id| {
            let registered = self.registry.get(worker_id).cloned();
            let worker_ctx = ctx.for_worker(worker_id);
            let worker_id = worker_id.clone();
            let default_timeout = self.default_timeout;
            async move {
                let started = Instant::now();
                let result = match registered {
                    Some(registered) => {
                        let limit = registered
                            .descriptor
                            .timeout_ms
                            .map(Duration::from_millis)
                            .unwrap_or(default_timeout);
                        run_isolated(&worker_id, registered.assessor, worker_ctx, limit).await
                    }
                    None => Err(failure(format!("worker '{worker_id}' is not registered"))),
                };
                let elapsed_ms = started.elapsed().as_millis().min(u64::MAX as u128) as u64;
                if let Err(err) = &result {
                    tracing::warn!(
                        target: "executor",
                        worker_id = %worker_id,
                        kind = ?err.kind,
                        elapsed_ms,
                        error = %err,
                        "worker_failed_neutral"
                    );
                }
                WorkerOutcome {
                    worker_id,
                    elapsed_ms,
                    result,
                }
            }
        });

        join_all(tasks).await
    }
}

async fn run_isolated(
    worker_id: &str,
    assessor: Arc<dyn Assessor>,
    ctx: AssessmentContext,
    limit: Duration,
) -> Result<Proposal, WorkerError> {
    let mut handle = tokio::spawn(async move { assessor.assess(ctx).await });
    let output = match tokio::time::timeout(limit, &mut handle).await {
        Ok(Ok(output)) => output?,
        Ok(Err(join_err)) if join_err.is_panic() => {
            return Err(panicked(format!("worker '{worker_id}' panicked")));
        }
        Ok(Err(join_err)) => {
            return Err(failure(format!("worker '{worker_id}' was cancelled: {join_err}")));
        }
        Err(_) => {
            handle.abort();
            return Err(timeout(format!(
                "worker '{worker_id}' exceeded {}ms",
                limit.as_millis()
            )));
        }
    };
    let draft = decode_output(output)?;
    Ok(Proposal::from_draft(worker_id, draft))
}
