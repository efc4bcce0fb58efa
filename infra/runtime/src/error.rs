use std::borrow::Cow;

/// Errors raised while building or operating a [`RuntimePool`](crate::RuntimePool).
#[arbor_derive::arbor_error]
pub enum PoolError {
    /// The OS refused the runtime (threads, stack, descriptors).
    #[error("Runtime error{}: {source}", format_context(.context))]
    Runtime { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Internal pool error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
