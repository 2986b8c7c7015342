//! Command abstractions.

use uuid::Uuid;

/// Trait implemented by every engine command.
///
/// Commands are plain data; the engine executes them and tags the resulting
/// notification with the command's correlation id.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable command name used in logs (e.g. `progression.complete_quest`).
    fn command_type(&self) -> &'static str;

    /// Correlation ID used to trace this command through its effects.
    fn correlation_id(&self) -> Uuid;
}
