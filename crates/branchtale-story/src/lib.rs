//! Branchtale: story graph and traversal engine.
//!
//! Holds one immutable, closure-checked story graph and a cursor into it,
//! and projects the current decision point for display.

pub mod application;
pub mod domain;
