use crate::bus::EventBus;
use crate::dispatcher::DispatchRequest;
use crate::event::{Event, Invocation};
use crate::state::{EventResult, EventState};
use std::fmt;
use std::marker::PhantomData;

/// Untyped core of every generated publisher: the node it publishes through.
///
/// Each call produces exactly one [`DispatchRequest`] and hands it to the tree's
/// dispatch strategy. Nothing is buffered or cached between calls.
pub struct Publisher<E: ?Sized> {
    bus: EventBus,
    _event: PhantomData<fn(&E)>,
}

impl<E: Event + ?Sized> Publisher<E> {
    #[must_use]
    pub const fn new(bus: EventBus) -> Self {
        Self { bus, _event: PhantomData }
    }

    /// The node this publisher is bound to.
    #[must_use]
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Publishes one call of `method`, replayed on subscribers through `call`.
    pub fn publish<F>(&self, method: &'static str, call: F) -> EventState
    where
        F: Fn(&E) -> EventResult + Send + Sync + 'static,
    {
        self.publish_invocation(Invocation::new(method, call))
    }

    pub fn publish_invocation(&self, invocation: Invocation<E>) -> EventState {
        let node = self.bus.clone();
        let request = DispatchRequest::new(E::NAME, invocation.method(), node.id(), move || {
            node.dispatch_event(&invocation)
        });
        self.bus.dispatcher().dispatch(request)
    }
}

impl<E: ?Sized> Clone for Publisher<E> {
    fn clone(&self) -> Self {
        Self { bus: self.bus.clone(), _event: PhantomData }
    }
}

impl<E: Event + ?Sized> fmt::Debug for Publisher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher").field("event", &E::NAME).field("node", &self.bus.id()).finish()
    }
}
