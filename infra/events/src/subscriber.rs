use crate::error::EventBusError;
use crate::event::Event;
use crate::failure::EventFailure;
use crate::handlers::ErrorHandlerRegistry;
use crate::registry::SubscriberRegistry;
use crate::state::EventState;
use std::fmt;
use std::sync::Arc;

/// A component that can be attached to a bus node.
///
/// Usually derived:
///
/// ```rust
/// use arbor_event_bus::{ErrorHandler, EventFailure, EventResult, EventState, Subscriber, event};
///
/// #[event]
/// pub trait Clipboard {
///     fn paste(&self, text: String) -> EventResult;
/// }
///
/// #[derive(Subscriber)]
/// #[subscriber(events(Clipboard), error_handler)]
/// struct Editor;
///
/// impl Clipboard for Editor {
///     fn paste(&self, _text: String) -> EventResult {
///         Ok(EventState::Resolved)
///     }
/// }
///
/// impl ErrorHandler for Editor {
///     fn on_error(&self, _failure: &EventFailure) -> EventState {
///         EventState::Passed
///     }
/// }
/// ```
pub trait Subscriber: Send + Sync + 'static {
    /// Declares every event trait (and the error-handler capability) this value serves.
    fn subscriptions(self: Arc<Self>, subscriptions: &mut Subscriptions<'_>);
}

/// Receives failures raised by subscribers of its node or of any descendant node.
pub trait ErrorHandler: Send + Sync + 'static {
    /// `Resolved` stops the failure from escalating further.
    fn on_error(&self, failure: &EventFailure) -> EventState;
}

type Staged = Box<dyn FnOnce(&SubscriberRegistry, usize) -> Result<bool, EventBusError> + Send>;

/// Registration sink handed to [`Subscriber::subscriptions`].
///
/// Registrations are staged and only committed once every declaration succeeded, so a
/// failed subscribe leaves the node untouched.
pub struct Subscriptions<'a> {
    identity: usize,
    subscribers: &'a SubscriberRegistry,
    handlers: &'a ErrorHandlerRegistry,
    staged: Vec<Staged>,
    handler: Option<Arc<dyn ErrorHandler>>,
    error: Option<EventBusError>,
}

impl<'a> Subscriptions<'a> {
    pub(crate) const fn new(
        identity: usize,
        subscribers: &'a SubscriberRegistry,
        handlers: &'a ErrorHandlerRegistry,
    ) -> Self {
        Self { identity, subscribers, handlers, staged: Vec::new(), handler: None, error: None }
    }

    /// Registers `subscriber` for event `E`.
    ///
    /// `subscriber` must point at the allocation being subscribed; re-registering it is a no-op.
    pub fn event<E: Event + ?Sized>(&mut self, subscriber: Arc<E>) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        if identity(&subscriber) != self.identity {
            self.error = Some(EventBusError::Internal {
                message: "registration does not point at the subscribed allocation".into(),
                context: Some(E::NAME.into()),
            });
            return self;
        }

        self.staged
            .push(Box::new(move |registry: &SubscriberRegistry, id: usize| registry.add(id, subscriber)));
        self
    }

    /// Registers `handler` in the node's error-handler registry.
    pub fn error_handler(&mut self, handler: Arc<dyn ErrorHandler>) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        if identity(&handler) != self.identity {
            self.error = Some(EventBusError::Internal {
                message: "error handler does not point at the subscribed allocation".into(),
                context: Some("ErrorHandler".into()),
            });
            return self;
        }

        self.handler = Some(handler);
        self
    }

    /// Commits the staged registrations. Returns how many were new.
    pub(crate) fn finish(self) -> Result<usize, EventBusError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut registered = 0;
        for stage in self.staged {
            registered += usize::from(stage(self.subscribers, self.identity)?);
        }
        if let Some(handler) = self.handler {
            registered += usize::from(self.handlers.add(self.identity, handler));
        }
        Ok(registered)
    }
}

impl fmt::Debug for Subscriptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriptions")
            .field("identity", &format_args!("{:#x}", self.identity))
            .field("staged", &(self.staged.len() + usize::from(self.handler.is_some())))
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Address of the allocation behind `arc`, shared by every trait-object view of it.
pub(crate) fn identity<T: ?Sized>(arc: &Arc<T>) -> usize {
    Arc::as_ptr(arc).cast::<()>().addr()
}
