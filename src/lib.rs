// Library surface for integration tests and embedders; the binary lives in main.rs.
pub mod cli;
pub mod config;
pub mod decision;
pub mod deliberation;
pub mod event_log;
pub mod logging;
pub mod orchestrator;
pub mod scheduler;
pub mod types;
pub mod worker;
pub mod workspace;
