//! Application layer: the orchestrator, its shared state and poll schedule.

pub mod orchestrator;
pub mod schedule;
pub mod snapshot;
