use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::{ClaimId, WorkerId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum StanceDimension {
    Valence,
    Warmth,
    Openness,
    Directness,
    Playfulness,
    Concern,
    Curiosity,
    Certainty,
}

impl StanceDimension {
    pub const ALL: [StanceDimension; 8] = [
        Self::Valence,
        Self::Warmth,
        Self::Openness,
        Self::Directness,
        Self::Playfulness,
        Self::Concern,
        Self::Curiosity,
        Self::Certainty,
    ];

    pub fn bounds(self) -> (f64, f64) {
        match self {
            Self::Valence => (-1.0, 1.0),
            _ => (0.0, 1.0),
        }
    }

    pub fn resting_value(self) -> f64 {
        match self {
            Self::Valence => 0.0,
            Self::Warmth => 0.6,
            Self::Openness => 0.5,
            Self::Directness => 0.5,
            Self::Playfulness => 0.3,
            Self::Concern => 0.2,
            Self::Curiosity => 0.5,
            Self::Certainty => 0.5,
        }
    }
}

/// Eight independently bounded affect dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StanceVector {
    pub valence: f64,
    pub warmth: f64,
    pub openness: f64,
    pub directness: f64,
    pub playfulness: f64,
    pub concern: f64,
    pub curiosity: f64,
    pub certainty: f64,
}

impl Default for StanceVector {
    fn default() -> Self {
        let mut stance = Self {
            valence: 0.0,
            warmth: 0.0,
            openness: 0.0,
            directness: 0.0,
            playfulness: 0.0,
            concern: 0.0,
            curiosity: 0.0,
            certainty: 0.0,
        };
        for dimension in StanceDimension::ALL {
            stance.set(dimension, dimension.resting_value());
        }
        stance
    }
}

impl StanceVector {
    pub fn get(&self, dimension: StanceDimension) -> f64 {
        match dimension {
            StanceDimension::Valence => self.valence,
            StanceDimension::Warmth => self.warmth,
            StanceDimension::Openness => self.openness,
            StanceDimension::Directness => self.directness,
            StanceDimension::Playfulness => self.playfulness,
            StanceDimension::Concern => self.concern,
            StanceDimension::Curiosity => self.curiosity,
            StanceDimension::Certainty => self.certainty,
        }
    }

    pub fn set(&mut self, dimension: StanceDimension, value: f64) {
        let (lo, hi) = dimension.bounds();
        let value = value.clamp(lo, hi);
        match dimension {
            StanceDimension::Valence => self.valence = value,
            StanceDimension::Warmth => self.warmth = value,
            StanceDimension::Openness => self.openness = value,
            StanceDimension::Directness => self.directness = value,
            StanceDimension::Playfulness => self.playfulness = value,
            StanceDimension::Concern => self.concern = value,
            StanceDimension::Curiosity => self.curiosity = value,
            StanceDimension::Certainty => self.certainty = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModulatorKind {
    Arousal,
    Strain,
    Engagement,
    Fatigue,
}

impl ModulatorKind {
    pub const ALL: [ModulatorKind; 4] = [
        Self::Arousal,
        Self::Strain,
        Self::Engagement,
        Self::Fatigue,
    ];

    pub fn baseline(self) -> f64 {
        match self {
            Self::Arousal => 0.3,
            Self::Strain => 0.2,
            Self::Engagement => 0.5,
            Self::Fatigue => 0.1,
        }
    }

    pub fn signal_name(self) -> &'static str {
        match self {
            Self::Arousal => "arousal",
            Self::Strain => "strain",
            Self::Engagement => "engagement",
            Self::Fatigue => "fatigue",
        }
    }
}

/// Slow-moving global modulators in `[0, 1]`, decaying toward their baselines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalModulators {
    pub arousal: f64,
    pub strain: f64,
    pub engagement: f64,
    pub fatigue: f64,
}

impl Default for GlobalModulators {
    fn default() -> Self {
        Self {
            arousal: ModulatorKind::Arousal.baseline(),
            strain: ModulatorKind::Strain.baseline(),
            engagement: ModulatorKind::Engagement.baseline(),
            fatigue: ModulatorKind::Fatigue.baseline(),
        }
    }
}

impl GlobalModulators {
    pub fn get(&self, kind: ModulatorKind) -> f64 {
        match kind {
            ModulatorKind::Arousal => self.arousal,
            ModulatorKind::Strain => self.strain,
            ModulatorKind::Engagement => self.engagement,
            ModulatorKind::Fatigue => self.fatigue,
        }
    }

    pub fn set(&mut self, kind: ModulatorKind, value: f64) {
        let value = value.clamp(0.0, 1.0);
        match kind {
            ModulatorKind::Arousal => self.arousal = value,
            ModulatorKind::Strain => self.strain = value,
            ModulatorKind::Engagement => self.engagement = value,
            ModulatorKind::Fatigue => self.fatigue = value,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Observation,
    Recommendation,
    Concern,
    Question,
}

impl ClaimType {
    pub const ALL: [ClaimType; 4] = [
        Self::Observation,
        Self::Recommendation,
        Self::Concern,
        Self::Question,
    ];

    pub fn consensus_weight(self) -> f64 {
        match self {
            Self::Recommendation | Self::Concern => 2.0,
            Self::Observation => 1.0,
            Self::Question => 0.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Observation => "observation",
            Self::Recommendation => "recommendation",
            Self::Concern => "concern",
            Self::Question => "question",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub text: String,
    #[serde(rename = "type")]
    pub claim_type: ClaimType,
    pub source: WorkerId,
    pub urgency: f64,
    pub confidence: f64,
    #[serde(default)]
    pub supports: Vec<ClaimId>,
    #[serde(default)]
    pub opposes: Vec<ClaimId>,
    #[serde(default)]
    pub contributors: BTreeSet<WorkerId>,
    /// Per-contributor urgency and confidence. `urgency`/`confidence` hold their maximum.
    #[serde(default)]
    pub assertions: BTreeMap<WorkerId, ClaimAssertion>,
}

impl Claim {
    /// Re-derives urgency and confidence from the assertions still on record.
    pub fn settle_assertions(&mut self) {
        if self.assertions.is_empty() {
            return;
        }
        let (urgency, confidence) = self
            .assertions
            .values()
            .fold((0.0_f64, 0.0_f64), |(urgency, confidence), assertion| {
                (urgency.max(assertion.urgency), confidence.max(assertion.confidence))
            });
        self.urgency = urgency;
        self.confidence = confidence;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClaimAssertion {
    pub urgency: f64,
    pub confidence: f64,
}

/// Value accepted by an allow-listed workspace field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PatchValue {
    List(Vec<String>),
    Text(String),
}

pub type WorkspacePatch = BTreeMap<String, PatchValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    #[serde(default)]
    pub episodes: Vec<String>,
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub open_threads: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnContext {
    pub user_message: String,
    #[serde(default)]
    pub retrieved: RetrievedContext,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub pending_asks: Vec<String>,
    #[serde(default)]
    pub open_threads: Vec<String>,
    #[serde(default)]
    pub focus_topic: Option<String>,
}

/// Persistent state captured at turn start so a single turn replays from a fresh workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceBaseline {
    pub stance: StanceVector,
    pub modulators: GlobalModulators,
}
