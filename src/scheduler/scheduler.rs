use std::{
    collections::{BTreeMap, BTreeSet},
    time::{Duration, Instant},
};

use crate::{
    scheduler::types::{
        PriorityTier, ScheduledWorker, SchedulerConfig, Wave, WavePlan, WorkerDescriptor,
    },
    types::WorkerId,
};

/// Plans the waves of one turn from injected descriptors and live signal levels.
#[derive(Debug, Clone)]
pub struct Scheduler {
    descriptors: Vec<WorkerDescriptor>,
    config: SchedulerConfig,
    cooldown_until: BTreeMap<WorkerId, Instant>,
}

impl Scheduler {
    pub fn new(mut descriptors: Vec<WorkerDescriptor>, config: SchedulerConfig) -> Self {
        descriptors.sort_by(|left, right| left.id.cmp(&right.id));
        descriptors.dedup_by(|left, right| left.id == right.id);
        Self {
            descriptors,
            config,
            cooldown_until: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn descriptor(&self, worker_id: &str) -> Option<&WorkerDescriptor> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.id == worker_id)
    }

    pub fn cooldown_active(&self, worker_id: &str, now: Instant) -> bool {
        self.cooldown_until
            .get(worker_id)
            .is_some_and(|until| now < *until)
    }

    pub fn mark_fired(&mut self, worker_id: &str, now: Instant) {
        let Some(cooldown_ms) = self
            .descriptor(worker_id)
            .map(|descriptor| descriptor.cooldown_ms)
        else {
            return;
        };
        if cooldown_ms == 0 {
            self.cooldown_until.remove(worker_id);
            return;
        }
        let until = now + Duration::from_millis(cooldown_ms);
        self.cooldown_until.insert(worker_id.to_string(), until);
    }

    /// `base_priority` plus the level of every domain signal above the boost threshold.
    pub fn priority_score(&self, descriptor: &WorkerDescriptor, signals: &BTreeMap<String, f64>) -> f64 {
        descriptor.base_priority
            + descriptor
                .domains
                .iter()
                .filter_map(|domain| signals.get(domain))
                .filter(|level| **level > self.config.boost_threshold)
                .sum::<f64>()
    }

    fn boosted(&self, descriptor: &WorkerDescriptor, signals: &BTreeMap<String, f64>) -> bool {
        descriptor
            .domains
            .iter()
            .filter_map(|domain| signals.get(domain))
            .any(|level| *level > self.config.boost_threshold)
    }

    pub fn plan(&self, signals: &BTreeMap<String, f64>, now: Instant) -> WavePlan {
        let mut plan = WavePlan::default();
        let mut planned: BTreeSet<&str> = BTreeSet::new();

        let always_on: Vec<ScheduledWorker> = self
            .descriptors
            .iter()
            .filter(|descriptor| descriptor.tier == PriorityTier::AlwaysOn)
            .filter(|descriptor| planned.insert(descriptor.id.as_str()))
            .map(|descriptor| ScheduledWorker {
                worker_id: descriptor.id.clone(),
                score: self.priority_score(descriptor, signals),
            })
            .collect();
        let remaining = self.config.turn_budget.saturating_sub(always_on.len());
        if !always_on.is_empty() {
            plan.waves.push(Wave {
                index: 0,
                workers: always_on,
            });
        }

        let mut candidates: Vec<ScheduledWorker> = Vec::new();
        for descriptor in &self.descriptors {
            if descriptor.tier == PriorityTier::AlwaysOn || planned.contains(descriptor.id.as_str()) {
                continue;
            }
            if descriptor.tier == PriorityTier::Monitor && !self.boosted(descriptor, signals) {
                continue;
            }
            if self.cooldown_active(&descriptor.id, now) {
                plan.cooling_down.push(descriptor.id.clone());
                continue;
            }
            planned.insert(descriptor.id.as_str());
            candidates.push(ScheduledWorker {
                worker_id: descriptor.id.clone(),
                score: self.priority_score(descriptor, signals),
            });
        }
        candidates.sort_by(|left, right| {
            right
                .score
                .total_cmp(&left.score)
                .then_with(|| left.worker_id.cmp(&right.worker_id))
        });
        if candidates.len() > remaining {
            plan.over_budget = candidates
                .split_off(remaining)
                .into_iter()
                .map(|worker| worker.worker_id)
                .collect();
        }

        let width = self.config.wave_width.max(1);
        for chunk in candidates.chunks(width) {
            let index = plan.waves.len();
            plan.waves.push(Wave {
                index,
                workers: chunk.to_vec(),
            });
        }

        tracing::debug!(
            target: "scheduler",
            waves = plan.waves.len(),
            workers = plan.worker_count(),
            cooling_down = ?plan.cooling_down,
            over_budget = ?plan.over_budget,
            "wave_plan_built"
        );
        plan
    }
}
