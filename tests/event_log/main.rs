mod projection;

use concord::{
    event_log::EventPayload,
    orchestrator::TurnStage,
    workspace::{ModulatorKind, Workspace},
};

pub fn turn_started(message: &str) -> EventPayload {
    EventPayload::TurnStarted {
        user_message: message.to_string(),
        constraints: Vec::new(),
        baseline: Workspace::new("s1").baseline(),
    }
}

pub fn stage(stage: TurnStage) -> EventPayload {
    EventPayload::StageChanged { stage }
}

pub fn nudge(delta: f64) -> EventPayload {
    EventPayload::ModulatorNudged {
        modulator: ModulatorKind::Arousal,
        delta,
    }
}
