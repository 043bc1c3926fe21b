//! Shared test fakes and fixtures for Branchtale.

mod clock;
mod fixtures;
mod service;

pub use clock::FixedClock;
pub use fixtures::{
    branching_story, completed, cyclic_story, failed, failed_without_reason, pending, processing,
};
pub use service::{FailingStoryService, ScriptedStoryService};
