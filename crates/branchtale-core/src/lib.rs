//! Branchtale Core: shared abstractions.
//!
//! Identifiers, the wire contracts of the external job/story service, the
//! `StoryService` seam, and the error and clock types every other crate
//! depends on. It contains no infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod ids;
pub mod service;
pub mod wire;
