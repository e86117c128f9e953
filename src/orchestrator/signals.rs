use std::collections::BTreeMap;

use crate::{
    decision::SafetyScreen,
    orchestrator::types::TurnSignals,
    workspace::{GlobalModulators, ModulatorKind},
};

const QUESTION_OPENERS: [&str; 17] = [
    "what", "why", "how", "when", "where", "who", "which", "can", "could", "would", "should",
    "is", "are", "do", "does", "did", "will",
];

/// Fast, deterministic signal extraction over the raw user message.
#[derive(Debug, Clone, Default)]
pub struct SignalExtractor {
    safety: SafetyScreen,
}

impl SignalExtractor {
    pub fn new(safety: SafetyScreen) -> Self {
        Self { safety }
    }

    pub fn extract(&self, message: &str) -> TurnSignals {
        let trimmed = message.trim();
        let first_word = trimmed
            .split(|c: char| !c.is_alphanumeric())
            .find(|word| !word.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let interrogative =
            trimmed.ends_with('?') || QUESTION_OPENERS.contains(&first_word.as_str());
        let question_marks = trimmed.matches('?').count();
        let inquiry = if interrogative {
            (0.5 + 0.25 * question_marks as f64).min(1.0)
        } else {
            0.0
        };

        TurnSignals {
            interrogative,
            intensity: intensity(trimmed),
            inquiry,
            risk: self.safety.assess(trimmed).map(|signal| signal.matched),
        }
    }

    /// Named levels the scheduler matches against worker domains.
    pub fn levels(signals: &TurnSignals, modulators: &GlobalModulators) -> BTreeMap<String, f64> {
        let mut levels: BTreeMap<String, f64> = ModulatorKind::ALL
            .iter()
            .map(|kind| (kind.signal_name().to_string(), modulators.get(*kind)))
            .collect();
        levels.insert("intensity".to_string(), signals.intensity);
        levels.insert("inquiry".to_string(), signals.inquiry);
        if signals.risk.is_some() {
            levels.insert("risk".to_string(), 1.0);
        }
        levels
    }
}

fn intensity(message: &str) -> f64 {
    let exclamations = message.matches('!').count() as f64;
    let letters: Vec<char> = message.chars().filter(|c| c.is_alphabetic()).collect();
    let shouting = if letters.len() >= 8 {
        letters.iter().filter(|c| c.is_uppercase()).count() as f64 / letters.len() as f64
    } else {
        0.0
    };
    (exclamations * 0.2 + shouting * 0.6).min(1.0)
}
