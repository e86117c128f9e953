pub mod reducer;
pub mod state;
pub mod types;

pub use reducer::{
    MergeMode, Reducer, Reduction, ReductionReport, StanceChange, derive_claim_id, token_overlap,
};
pub use state::Workspace;
pub use types::{
    Claim, ClaimAssertion, ClaimType, GlobalModulators, ModulatorKind, PatchValue, RetrievedContext,
    StanceDimension, StanceVector, TurnContext, WorkspaceBaseline, WorkspacePatch,
};
