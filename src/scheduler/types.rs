use serde::{Deserialize, Serialize};

use crate::types::WorkerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    AlwaysOn,
    Monitor,
    Normal,
}

fn default_tier() -> PriorityTier {
    PriorityTier::Normal
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerDescriptor {
    pub id: WorkerId,
    #[serde(default = "default_tier")]
    pub tier: PriorityTier,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub cooldown_ms: u64,
    #[serde(default)]
    pub base_priority: f64,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl WorkerDescriptor {
    pub fn new(id: impl Into<WorkerId>, tier: PriorityTier) -> Self {
        Self {
            id: id.into(),
            tier,
            domains: Vec::new(),
            cooldown_ms: 0,
            base_priority: 0.0,
            timeout_ms: None,
        }
    }

    pub fn with_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cooldown_ms(mut self, cooldown_ms: u64) -> Self {
        self.cooldown_ms = cooldown_ms;
        self
    }

    pub fn with_base_priority(mut self, base_priority: f64) -> Self {
        self.base_priority = base_priority;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

fn default_turn_budget() -> usize {
    8
}

fn default_wave_width() -> usize {
    4
}

fn default_timeout_ms() -> u64 {
    8_000
}

fn default_boost_threshold() -> f64 {
    0.6
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_turn_budget")]
    pub turn_budget: usize,
    #[serde(default = "default_wave_width")]
    pub wave_width: usize,
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    #[serde(default = "default_boost_threshold")]
    pub boost_threshold: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            turn_budget: default_turn_budget(),
            wave_width: default_wave_width(),
            default_timeout_ms: default_timeout_ms(),
            boost_threshold: default_boost_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledWorker {
    pub worker_id: WorkerId,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    pub index: usize,
    pub workers: Vec<ScheduledWorker>,
}

impl Wave {
    pub fn worker_ids(&self) -> Vec<WorkerId> {
        self.workers
            .iter()
            .map(|worker| worker.worker_id.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WavePlan {
    pub waves: Vec<Wave>,
    /// Workers skipped because their cooldown was still running.
    pub cooling_down: Vec<WorkerId>,
    /// Eligible workers cut by the per-turn budget.
    pub over_budget: Vec<WorkerId>,
}

impl WavePlan {
    pub fn worker_count(&self) -> usize {
        self.waves.iter().map(|wave| wave.workers.len()).sum()
    }

    pub fn contains(&self, worker_id: &str) -> bool {
        self.waves
            .iter()
            .any(|wave| wave.workers.iter().any(|worker| worker.worker_id == worker_id))
    }
}
