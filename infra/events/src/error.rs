use std::borrow::Cow;

/// Errors that can occur during event bus operations.
#[arbor_derive::arbor_error]
pub enum EventBusError {
    /// Occurs when a registry entry does not downcast to the requested event type.
    /// This indicates an invariant violation in the type registry.
    #[error("Type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The bus node (or the worker pool behind it) has been shut down.
    #[error("Shut down{}: {message}", format_context(.context))]
    Shutdown { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A worker pool refused a dispatch task.
    #[error("Task rejected{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal logic errors.
    #[error("Internal event bus error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
