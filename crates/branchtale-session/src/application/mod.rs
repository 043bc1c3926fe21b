//! Application layer: the play session.

pub mod play_session;
