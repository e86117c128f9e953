pub mod safety;
pub mod triage;
pub mod types;

pub use safety::{PROTECTIVE_RESPONSE, SafetyScreen, SafetySignal};
pub use triage::Triage;
pub use types::{Decision, DecisionIntent, DecisionUrgency, TriageInput};
