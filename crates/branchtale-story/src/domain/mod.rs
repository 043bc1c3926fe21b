//! Domain layer: the story graph and its read-only projections.

pub mod graph;
pub mod view;
