//! Branchtale: story generation job orchestration.
//!
//! Submits a theme to the external generation service, polls the resulting
//! job on a cancellable schedule, and resolves it to a story identifier or a
//! terminal failure.

pub mod application;
pub mod domain;
