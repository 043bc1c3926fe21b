//! Domain layer for generation jobs.

pub mod job;
pub mod outcome;
