//! Application layer: traversal and loading.

pub mod engine;
pub mod loader;
