use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    time::{Duration, Instant},
};

use tokio_stream::Stream;

use crate::{
    decision::{Decision, PROTECTIVE_RESPONSE, SafetyScreen, Triage, TriageInput},
    deliberation::{
        ArgumentGraph, ConsensusResult, DeliberationConfig, DeliberationStep, Deliberator,
        DoneReason, PolarityMarkers,
    },
    event_log::{Event, EventLog, EventLogReader, EventPayload, apply_event, project_session},
    orchestrator::{
        error::TurnError,
        noop::{NoopMemoryCommitter, NoopMemoryRetriever, TemplateRenderer},
        ports::{Critic, MemoryCommitter, MemoryRetriever, ResponseRenderer},
        signals::SignalExtractor,
        types::{TurnInput, TurnOutcome, TurnRecord, TurnStage, TurnStatus},
    },
    scheduler::{Scheduler, SchedulerConfig},
    types::{ClaimId, SessionId, TurnId, WorkerId},
    worker::{AssessmentContext, WorkerExecutor, WorkerRegistry},
    workspace::{
        Claim, MergeMode, ModulatorKind, Reducer, ReductionReport, Workspace,
        reducer::MAX_MODULATOR_NUDGE,
    },
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrchestratorSettings {
    pub scheduler: SchedulerConfig,
    pub deliberation: DeliberationConfig,
}

/// Outcome of the deliberation stage, carried into decision and commit.
struct Deliberated {
    consensus: ConsensusResult,
    rounds: u32,
    reason: DoneReason,
}

/// Single entry point for a session: sequences every stage into the event log.
pub struct TurnOrchestrator {
    session_id: SessionId,
    workspace: Workspace,
    reducer: Reducer,
    log: EventLog,
    scheduler: Scheduler,
    executor: WorkerExecutor,
    worker_ids: BTreeSet<WorkerId>,
    deliberation: DeliberationConfig,
    signals: SignalExtractor,
    triage: Triage,
    retriever: Arc<dyn MemoryRetriever>,
    renderer: Arc<dyn ResponseRenderer>,
    critics: Vec<Arc<dyn Critic>>,
    committer: Arc<dyn MemoryCommitter>,
    last_turn_id: TurnId,
}

impl TurnOrchestrator {
    pub fn new(
        session_id: impl Into<SessionId>,
        registry: WorkerRegistry,
        log: EventLog,
        settings: OrchestratorSettings,
    ) -> Self {
        let session_id = session_id.into();
        let descriptors = registry.descriptors();
        let worker_ids = descriptors.iter().map(|descriptor| descriptor.id.clone()).collect();
        let default_timeout = Duration::from_millis(settings.scheduler.default_timeout_ms);
        Self {
            workspace: Workspace::new(session_id.clone()),
            session_id,
            reducer: Reducer::default(),
            log,
            scheduler: Scheduler::new(descriptors, settings.scheduler),
            executor: WorkerExecutor::new(Arc::new(registry), default_timeout),
            worker_ids,
            deliberation: settings.deliberation,
            signals: SignalExtractor::default(),
            triage: Triage,
            retriever: Arc::new(NoopMemoryRetriever),
            renderer: Arc::new(TemplateRenderer),
            critics: Vec::new(),
            committer: Arc::new(NoopMemoryCommitter),
            last_turn_id: 0,
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn MemoryRetriever>) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ResponseRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_critic(mut self, critic: Arc<dyn Critic>) -> Self {
        self.critics.push(critic);
        self
    }

    pub fn with_committer(mut self, committer: Arc<dyn MemoryCommitter>) -> Self {
        self.committer = committer;
        self
    }

    pub fn with_markers(mut self, markers: PolarityMarkers) -> Self {
        self.reducer = Reducer::new(markers);
        self
    }

    pub fn with_safety_screen(mut self, screen: SafetyScreen) -> Self {
        self.signals = SignalExtractor::new(screen);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn reducer(&self) -> &Reducer {
        &self.reducer
    }

    pub fn last_turn_id(&self) -> TurnId {
        self.last_turn_id
    }

    pub fn event_reader(&self) -> EventLogReader {
        self.log.reader()
    }

    pub fn subscribe(&self) -> impl Stream<Item = Event> + Send + Unpin + 'static {
        self.log.subscribe()
    }

    /// Rebuilds the workspace from whatever this session already has in the store.
    pub fn restore(&mut self) -> Result<(), TurnError> {
        let events = self.log.reader().replay_session(&self.session_id)?;
        if events.is_empty() {
            return Ok(());
        }
        // A trailing turn holding only maintenance events has not started yet.
        self.last_turn_id = events
            .iter()
            .rev()
            .find(|event| matches!(event.payload, EventPayload::TurnStarted { .. }))
            .map_or(0, |event| event.turn_id);
        self.workspace = project_session(&self.reducer, &self.session_id, &events)?;
        tracing::info!(
            target: "orchestrator",
            session_id = %self.session_id,
            last_turn_id = self.last_turn_id,
            events = events.len(),
            "session_restored"
        );
        Ok(())
    }

    /// Between-turn maintenance: decays modulators toward baseline.
    /// Logged as the prelude of the next turn, so completed turns stay closed.
    pub fn maintenance_tick(&mut self, elapsed_ms: u64) -> Result<(), TurnError> {
        self.emit(
            self.pending_turn_id(),
            EventPayload::ModulatorsDecayed { elapsed_ms },
        )?;
        Ok(())
    }

    pub fn nudge(&mut self, modulator: ModulatorKind, delta: f64) -> Result<(), TurnError> {
        self.emit(
            self.pending_turn_id(),
            EventPayload::ModulatorNudged { modulator, delta },
        )?;
        Ok(())
    }

    fn pending_turn_id(&self) -> TurnId {
        self.last_turn_id.saturating_add(1)
    }

    #[tracing::instrument(
        name = "run_turn",
        target = "orchestrator",
        skip(self, input),
        fields(session_id = %self.session_id)
    )]
    pub async fn run_turn(&mut self, input: TurnInput) -> Result<TurnOutcome, TurnError> {
        let user_message = input.user_message.trim().to_string();
        if user_message.is_empty() {
            return Err(TurnError::InvalidInput(
                "user message cannot be empty".to_string(),
            ));
        }

        let turn_id = self.pending_turn_id();
        self.last_turn_id = turn_id;
        let baseline = self.workspace.baseline();
        self.emit(
            turn_id,
            EventPayload::TurnStarted {
                user_message: user_message.clone(),
                constraints: input.constraints,
                baseline,
            },
        )?;
        self.stage(turn_id, TurnStage::Ingest)?;

        self.stage(turn_id, TurnStage::Signals)?;
        let signals = self.signals.extract(&user_message);
        if signals.intensity > 0.0 {
            self.emit(
                turn_id,
                EventPayload::ModulatorNudged {
                    modulator: ModulatorKind::Arousal,
                    delta: signals.intensity * MAX_MODULATOR_NUDGE,
                },
            )?;
        }
        let levels = SignalExtractor::levels(&signals, &self.workspace.modulators);
        self.emit(
            turn_id,
            EventPayload::SignalsExtracted {
                signals: signals.clone(),
                levels: levels.clone(),
            },
        )?;
        if let Some(matched) = signals.risk.clone() {
            return self.interrupt(turn_id, matched);
        }

        self.stage(turn_id, TurnStage::Retrieval)?;
        self.retrieve(turn_id, &user_message).await?;

        self.stage(turn_id, TurnStage::Waves)?;
        let mut failed = BTreeSet::new();
        let now = Instant::now();
        let plan = self.scheduler.plan(&levels, now);
        for wave in &plan.waves {
            let workers = wave.worker_ids();
            self.run_round(
                turn_id,
                (0, wave.index),
                &workers,
                &levels,
                Vec::new(),
                MergeMode::Append,
                &mut failed,
            )
            .await?;
            for worker_id in &workers {
                self.scheduler.mark_fired(worker_id, now);
            }
        }

        self.stage(turn_id, TurnStage::Deliberation)?;
        let deliberated = self.deliberate(turn_id, &levels, &mut failed).await?;

        self.stage(turn_id, TurnStage::Decision)?;
        let top_claims: Vec<Claim> = deliberated
            .consensus
            .top_claims
            .iter()
            .filter_map(|ranked| self.workspace.claim(&ranked.claim_id).cloned())
            .collect();
        let decision = self.triage.decide(&TriageInput {
            top_claims: &top_claims,
            modulators: &self.workspace.modulators,
            interrogative: signals.interrogative,
            proposal_urgency: self.workspace.peak_proposal_urgency(),
        });
        self.emit(
            turn_id,
            EventPayload::DecisionMade {
                decision: decision.clone(),
            },
        )?;

        self.stage(turn_id, TurnStage::Response)?;
        let ctx = AssessmentContext::from_workspace(
            &self.workspace,
            deliberated.rounds,
            deliberated.consensus.contested_claims.clone(),
            levels,
        );
        let rendered = if decision.should_respond {
            self.render(turn_id, &decision, &ctx).await?
        } else {
            None
        };

        self.stage(turn_id, TurnStage::Validation)?;
        let (critic_blocked, critic_reasons) =
            self.validate(turn_id, &decision, rendered.as_deref(), &ctx).await?;
        let response = if critic_blocked { None } else { rendered };

        self.stage(turn_id, TurnStage::Commit)?;
        let record = TurnRecord {
            session_id: self.session_id.clone(),
            turn_id,
            user_message,
            decision: decision.clone(),
            response: response.clone(),
            top_claim_ids: top_claims.iter().map(|claim| claim.id.clone()).collect(),
            top_claims,
        };
        self.commit(turn_id, &record).await?;

        let fingerprint = self.finish(turn_id, TurnStatus::Completed)?;
        Ok(TurnOutcome {
            session_id: self.session_id.clone(),
            turn_id,
            status: TurnStatus::Completed,
            decision,
            response,
            critic_blocked,
            critic_reasons,
            consensus: Some(deliberated.consensus),
            follow_up_rounds: deliberated.rounds,
            done_reason: Some(deliberated.reason),
            failed_workers: failed.into_iter().collect(),
            fingerprint,
        })
    }

    fn interrupt(&mut self, turn_id: TurnId, matched: String) -> Result<TurnOutcome, TurnError> {
        tracing::warn!(
            target: "orchestrator",
            session_id = %self.session_id,
            turn_id,
            matched = %matched,
            "safety_interrupt"
        );
        self.emit(
            turn_id,
            EventPayload::SafetyInterrupt {
                matched: matched.clone(),
            },
        )?;

        self.stage(turn_id, TurnStage::Decision)?;
        let decision = Decision::protective(format!("safety interrupt: {matched}"));
        self.emit(
            turn_id,
            EventPayload::DecisionMade {
                decision: decision.clone(),
            },
        )?;

        self.stage(turn_id, TurnStage::Response)?;
        let response = PROTECTIVE_RESPONSE.to_string();
        self.emit(
            turn_id,
            EventPayload::ResponseRendered {
                text: response.clone(),
            },
        )?;

        let fingerprint = self.finish(turn_id, TurnStatus::SafetyInterrupted)?;
        Ok(TurnOutcome {
            session_id: self.session_id.clone(),
            turn_id,
            status: TurnStatus::SafetyInterrupted,
            decision,
            response: Some(response),
            critic_blocked: false,
            critic_reasons: Vec::new(),
            consensus: None,
            follow_up_rounds: 0,
            done_reason: None,
            failed_workers: Vec::new(),
            fingerprint,
        })
    }

    async fn retrieve(&mut self, turn_id: TurnId, query: &str) -> Result<(), TurnError> {
        let retriever = Arc::clone(&self.retriever);
        let payload = match retriever.retrieve(query, &self.workspace.context).await {
            Ok(context) => EventPayload::ContextRetrieved { context },
            Err(err) => {
                tracing::warn!(
                    target: "orchestrator",
                    turn_id,
                    error = %err,
                    "context_retrieval_failed"
                );
                EventPayload::ContextRetrievalFailed {
                    error: err.to_string(),
                }
            }
        };
        self.emit(turn_id, payload)?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_round(
        &mut self,
        turn_id: TurnId,
        (round, wave): (u32, usize),
        workers: &[WorkerId],
        levels: &BTreeMap<String, f64>,
        contested: Vec<ClaimId>,
        mode: MergeMode,
        failed: &mut BTreeSet<WorkerId>,
    ) -> Result<(), TurnError> {
        self.emit(
            turn_id,
            EventPayload::WaveScheduled {
                round,
                wave,
                workers: workers.to_vec(),
            },
        )?;
        for worker_id in workers {
            self.emit(
                turn_id,
                EventPayload::WorkerStarted {
                    round,
                    wave,
                    worker_id: worker_id.clone(),
                },
            )?;
        }

        let ctx =
            AssessmentContext::from_workspace(&self.workspace, round, contested, levels.clone());
        let outcomes = self.executor.run_wave(workers, &ctx).await;

        // Merges happen here, after the barrier, in wave order.
        for outcome in outcomes {
            match outcome.result {
                Ok(proposal) => {
                    let report = self.emit(
                        turn_id,
                        EventPayload::WorkerCompleted {
                            round,
                            worker_id: outcome.worker_id,
                            elapsed_ms: outcome.elapsed_ms,
                            mode,
                            proposal,
                        },
                    )?;
                    if let Some(report) = report {
                        self.emit(turn_id, EventPayload::WorkspacePatched { round, report })?;
                    }
                }
                Err(err) => {
                    failed.insert(outcome.worker_id.clone());
                    self.emit(
                        turn_id,
                        EventPayload::WorkerFailed {
                            round,
                            worker_id: outcome.worker_id,
                            elapsed_ms: outcome.elapsed_ms,
                            failure: err.kind,
                            error: err.message,
                        },
                    )?;
                }
            }
        }
        Ok(())
    }

    async fn deliberate(
        &mut self,
        turn_id: TurnId,
        levels: &BTreeMap<String, f64>,
        failed: &mut BTreeSet<WorkerId>,
    ) -> Result<Deliberated, TurnError> {
        let mut deliberator = Deliberator::new(self.deliberation.clone());
        loop {
            let graph = ArgumentGraph::from_workspace(&self.workspace, self.reducer.markers());
            let consensus = graph.consensus(self.deliberation.top_k);
            self.emit(
                turn_id,
                EventPayload::ConsensusUpdated {
                    round: deliberator.round(),
                    consensus: consensus.clone(),
                },
            )?;

            let available: BTreeSet<WorkerId> =
                self.worker_ids.difference(failed).cloned().collect();
            match deliberator.evaluate(&graph, &consensus, &available) {
                DeliberationStep::Done { reason, rounds } => {
                    tracing::info!(
                        target: "deliberation",
                        turn_id,
                        rounds,
                        reason = ?reason,
                        score = consensus.overall_score,
                        "deliberation_completed"
                    );
                    self.emit(
                        turn_id,
                        EventPayload::DeliberationCompleted { rounds, reason },
                    )?;
                    return Ok(Deliberated {
                        consensus,
                        rounds,
                        reason,
                    });
                }
                DeliberationStep::FollowUp {
                    round,
                    workers,
                    contested,
                } => {
                    self.run_round(
                        turn_id,
                        (round, 0),
                        &workers,
                        levels,
                        contested,
                        MergeMode::Revise,
                        failed,
                    )
                    .await?;
                }
            }
        }
    }

    async fn render(
        &mut self,
        turn_id: TurnId,
        decision: &Decision,
        ctx: &AssessmentContext,
    ) -> Result<Option<String>, TurnError> {
        let renderer = Arc::clone(&self.renderer);
        match renderer.render(decision, ctx).await {
            Ok(text) => {
                self.emit(
                    turn_id,
                    EventPayload::ResponseRendered { text: text.clone() },
                )?;
                Ok(Some(text))
            }
            Err(err) => {
                tracing::warn!(target: "orchestrator", turn_id, error = %err, "response_render_failed");
                self.emit(
                    turn_id,
                    EventPayload::ResponseFailed {
                        error: err.to_string(),
                    },
                )?;
                Ok(None)
            }
        }
    }

    async fn validate(
        &mut self,
        turn_id: TurnId,
        decision: &Decision,
        response: Option<&str>,
        ctx: &AssessmentContext,
    ) -> Result<(bool, Vec<String>), TurnError> {
        let critics = self.critics.clone();
        let mut blocked = false;
        let mut reasons = Vec::new();
        let mut errors = Vec::new();
        for critic in &critics {
            match critic.review(decision, response, ctx).await {
                Ok(verdict) if verdict.blocked => {
                    blocked = true;
                    reasons.push(
                        verdict
                            .reason
                            .unwrap_or_else(|| format!("blocked by {}", critic.name())),
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(
                        target: "orchestrator",
                        turn_id,
                        critic = critic.name(),
                        error = %err,
                        "critic_failed"
                    );
                    errors.push(format!("{}: {err}", critic.name()));
                }
            }
        }
        self.emit(
            turn_id,
            EventPayload::ValidationCompleted {
                blocked,
                reasons: reasons.clone(),
                errors,
            },
        )?;
        Ok((blocked, reasons))
    }

    async fn commit(&mut self, turn_id: TurnId, record: &TurnRecord) -> Result<(), TurnError> {
        let committer = Arc::clone(&self.committer);
        let payload = match committer.commit(record).await {
            Ok(()) => EventPayload::StateCommitted {
                top_claims: record.top_claim_ids.clone(),
            },
            Err(err) => {
                tracing::warn!(target: "orchestrator", turn_id, error = %err, "memory_commit_failed");
                EventPayload::CommitFailed {
                    error: err.to_string(),
                }
            }
        };
        self.emit(turn_id, payload)?;
        Ok(())
    }

    fn finish(&mut self, turn_id: TurnId, status: TurnStatus) -> Result<String, TurnError> {
        self.stage(turn_id, TurnStage::Completed)?;
        let fingerprint = self.workspace.fingerprint();
        self.emit(
            turn_id,
            EventPayload::TurnCompleted {
                status,
                fingerprint: fingerprint.clone(),
            },
        )?;
        tracing::info!(
            target: "orchestrator",
            session_id = %self.session_id,
            turn_id,
            status = ?status,
            "turn_completed"
        );
        Ok(fingerprint)
    }

    fn stage(&mut self, turn_id: TurnId, stage: TurnStage) -> Result<(), TurnError> {
        tracing::debug!(target: "orchestrator", turn_id, stage = ?stage, "turn_stage_changed");
        self.emit(turn_id, EventPayload::StageChanged { stage })?;
        Ok(())
    }

    /// Logs first, then applies through the same path replay uses.
    fn emit(
        &mut self,
        turn_id: TurnId,
        payload: EventPayload,
    ) -> Result<Option<ReductionReport>, TurnError> {
        let event = self.log.record(&self.session_id, turn_id, payload)?;
        let workspace = std::mem::take(&mut self.workspace);
        let (workspace, report) = apply_event(&self.reducer, workspace, &event);
        self.workspace = workspace;
        Ok(report)
    }
}

