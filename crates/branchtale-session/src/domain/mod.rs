//! Domain layer: caller commands and the session projection.

pub mod commands;
pub mod view;
