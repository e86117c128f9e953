pub mod deliberator;
pub mod graph;
pub mod markers;
pub mod types;

pub use deliberator::{DeliberationStep, Deliberator};
pub use graph::{ArgumentGraph, ClaimNode, Edge, EdgeKind};
pub use markers::{Polarity, PolarityMarkers};
pub use types::{ConsensusResult, DeliberationConfig, DeliberationPhase, DoneReason, RankedClaim};
