use crate::state::BoxError;
use std::any::Any;
use std::borrow::Cow;

/// A failure raised while a subscriber handled an event.
///
/// Delivered to [`ErrorHandler`](crate::ErrorHandler)s, never to the publisher.
/// The context names the failing `Event::method`.
#[arbor_derive::arbor_error]
pub enum EventFailure {
    /// The subscriber method returned an error.
    #[error("Subscriber failed{}: {source}", format_context(.context))]
    Subscriber { source: BoxError, context: Option<Cow<'static, str>> },

    /// The subscriber method panicked.
    #[error("Subscriber panicked{}: {message}", format_context(.context))]
    Panicked { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl EventFailure {
    /// The `Event::method` label attached at dispatch time, if any.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        match self {
            Self::Subscriber { context, .. } | Self::Panicked { context, .. } => context.as_deref(),
        }
    }

    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked { .. })
    }

    /// Attempts to view the subscriber's error as a concrete type.
    #[must_use]
    pub fn downcast_ref<T: std::error::Error + 'static>(&self) -> Option<&T> {
        match self {
            Self::Subscriber { source, .. } => source.downcast_ref::<T>(),
            Self::Panicked { .. } => None,
        }
    }

    pub(crate) fn from_panic(payload: &(dyn Any + Send), origin: String) -> Self {
        let message = payload.downcast_ref::<&'static str>().map_or_else(
            || {
                payload
                    .downcast_ref::<String>()
                    .map_or(Cow::Borrowed("unknown panic"), |msg| Cow::Owned(msg.clone()))
            },
            |msg| Cow::Borrowed(*msg),
        );
        Self::Panicked { message, context: Some(origin.into()) }
    }
}
