use crate::failure::{EventFailure, EventFailureExt};
use crate::publisher::Publisher;
use crate::state::{EventResult, EventState};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Binding between an event trait and its generated publisher.
///
/// Implemented for `dyn Trait` by the [`event`](crate::event) attribute; the
/// `TypeId` of `dyn Trait` is the registry key, so two event traits never alias.
pub trait Event: Send + Sync + 'static {
    /// Diagnostic name used in logs and failure contexts.
    const NAME: &'static str;

    /// Typed publisher whose methods mirror the trait.
    type Publisher: From<Publisher<Self>>;
}

type Call<E> = dyn Fn(&E) -> EventResult + Send + Sync;

/// One publisher call: the method name and a closure replaying it on a subscriber.
///
/// The same invocation is offered to each subscriber of a node and then to the
/// ancestors, so the closure clones its captured arguments on every replay.
pub struct Invocation<E: ?Sized> {
    method: &'static str,
    call: Arc<Call<E>>,
}

impl<E: Event + ?Sized> Invocation<E> {
    pub fn new<F>(method: &'static str, call: F) -> Self
    where
        F: Fn(&E) -> EventResult + Send + Sync + 'static,
    {
        Self { method, call: Arc::new(call) }
    }

    #[must_use]
    pub const fn event(&self) -> &'static str {
        E::NAME
    }

    #[must_use]
    pub const fn method(&self) -> &'static str {
        self.method
    }

    /// Runs the call against one subscriber, turning `Err` and panics into an [`EventFailure`].
    pub(crate) fn invoke(&self, subscriber: &E) -> Result<EventState, EventFailure> {
        match catch_unwind(AssertUnwindSafe(|| (self.call)(subscriber))) {
            Ok(result) => result.context(self.origin()),
            Err(payload) => Err(EventFailure::from_panic(&*payload, self.origin())),
        }
    }

    fn origin(&self) -> String {
        format!("{}::{}", E::NAME, self.method)
    }
}

impl<E: ?Sized> Clone for Invocation<E> {
    fn clone(&self) -> Self {
        Self { method: self.method, call: Arc::clone(&self.call) }
    }
}

impl<E: Event + ?Sized> fmt::Debug for Invocation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation").field("event", &E::NAME).field("method", &self.method).finish_non_exhaustive()
    }
}
