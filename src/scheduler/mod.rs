#[allow(clippy::module_inception)]
pub mod scheduler;
pub mod types;

pub use scheduler::Scheduler;
pub use types::{
    PriorityTier, ScheduledWorker, SchedulerConfig, Wave, WavePlan, WorkerDescriptor,
};
