pub mod error;
pub mod noop;
pub mod ports;
pub mod signals;
pub mod turn;
pub mod types;

pub use error::{
    CollaboratorError, CollaboratorErrorKind, TurnError, commit_failed, critic_failed,
    render_failed, retrieval_failed,
};
pub use noop::{NoopCritic, NoopMemoryCommitter, NoopMemoryRetriever, TemplateRenderer};
pub use ports::{Critic, MemoryCommitter, MemoryRetriever, ResponseRenderer};
pub use signals::SignalExtractor;
pub use turn::{OrchestratorSettings, TurnOrchestrator};
pub use types::{
    CriticVerdict, TurnInput, TurnOutcome, TurnRecord, TurnSignals, TurnStage, TurnStatus,
};
