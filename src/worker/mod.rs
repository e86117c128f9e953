pub mod decode;
pub mod error;
pub mod executor;
pub mod ports;
pub mod rules;
pub mod testing;
pub mod types;

pub use decode::{decode_output, decode_raw, proposal_schema};
pub use error::{WorkerError, WorkerErrorKind};
pub use executor::{RegisteredWorker, WorkerExecutor, WorkerOutcome, WorkerRegistry};
pub use ports::Assessor;
pub use rules::{AssessorRule, RuleAssessor};
pub use testing::HookAssessor;
pub use types::{AssessmentContext, AssessorOutput, ClaimDraft, Proposal, ProposalDraft};
