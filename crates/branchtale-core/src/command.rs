//! Caller actions expressed as values.

use uuid::Uuid;

/// Implemented by every action a caller can issue against a play session.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable name of the action, used as a tracing field.
    fn command_type(&self) -> &'static str;

    /// Correlation ID linking the action to the log lines it causes.
    fn correlation_id(&self) -> Uuid;
}
