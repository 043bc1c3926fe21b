//! Branchtale: play session.
//!
//! Joins one generation orchestrator and one story engine behind a single
//! lifecycle: `Idle → Generating → Playing`, with `Failed` reachable from
//! generation and from opening a story directly.

pub mod application;
pub mod domain;
