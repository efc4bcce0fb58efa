use crate::dispatcher::Dispatch;
use crate::error::{EventBusError, EventBusErrorExt};
use crate::event::{Event, Invocation};
use crate::failure::EventFailure;
use crate::handlers::ErrorHandlerRegistry;
use crate::publisher::Publisher;
use crate::registry::SubscriberRegistry;
use crate::state::EventState;
use crate::subscriber::{Subscriber, Subscriptions, identity};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a bus node, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

struct Node {
    id: NodeId,
    depth: usize,
    parent: Option<EventBus>,
    dispatcher: Arc<dyn Dispatch>,
    subscribers: SubscriberRegistry,
    handlers: ErrorHandlerRegistry,
    shutdown: AtomicBool,
}

/// A node of the bus tree.
///
/// Cheap to clone: clones are handles to the same node. A node only knows its parent,
/// which it keeps alive for as long as the node itself lives.
#[derive(Clone)]
pub struct EventBus {
    node: Arc<Node>,
}

impl EventBus {
    /// Creates a parentless node. Every descendant shares `dispatcher`.
    ///
    /// # Examples
    /// ```rust
    /// use arbor_event_bus::{EventBus, dispatcher};
    ///
    /// let root = EventBus::new_root(dispatcher::immediate());
    /// assert!(root.is_root());
    /// assert_eq!(root.depth(), 0);
    /// ```
    #[must_use]
    pub fn new_root(dispatcher: Arc<dyn Dispatch>) -> Self {
        let bus = Self::with_parent(None, 0, dispatcher);
        debug!(node = %bus.id(), dispatcher = ?bus.node.dispatcher, "Root bus created");
        bus
    }

    /// Creates a child node of `self`, inheriting its dispatcher.
    ///
    /// Valid on a shut-down node, though nothing will escalate through it.
    #[must_use]
    pub fn new_child(&self) -> Self {
        let bus = Self::with_parent(Some(self.clone()), self.depth() + 1, Arc::clone(&self.node.dispatcher));
        debug!(node = %bus.id(), parent = %self.id(), depth = bus.depth(), "Child bus created");
        bus
    }

    fn with_parent(parent: Option<Self>, depth: usize, dispatcher: Arc<dyn Dispatch>) -> Self {
        Self {
            node: Arc::new(Node {
                id: NodeId::next(),
                depth,
                parent,
                dispatcher,
                subscribers: SubscriberRegistry::default(),
                handlers: ErrorHandlerRegistry::default(),
                shutdown: AtomicBool::new(false),
            }),
        }
    }

    /// Registers `subscriber` for every event it declares, plus as an error handler if it
    /// declares that capability. Returns the number of new registrations.
    ///
    /// # Errors
    /// Returns [`EventBusError::Shutdown`] if the node is shut down, or
    /// [`EventBusError::TypeMismatch`] if the registry is corrupted.
    pub fn subscribe<T: Subscriber>(&self, subscriber: Arc<T>) -> Result<usize, EventBusError> {
        if self.is_shutdown() {
            return Err(EventBusError::Shutdown {
                message: std::any::type_name::<T>().into(),
                context: Some(self.id().to_string().into()),
            });
        }

        let id = identity(&subscriber);
        let mut subscriptions = Subscriptions::new(id, &self.node.subscribers, &self.node.handlers);
        subscriber.subscriptions(&mut subscriptions);
        let registered = subscriptions.finish().context(std::any::type_name::<T>())?;

        // Lost a race with shutdown: don't leave registrations behind.
        if self.is_shutdown() {
            self.clear();
            return Err(EventBusError::Shutdown {
                message: std::any::type_name::<T>().into(),
                context: Some(self.id().to_string().into()),
            });
        }

        debug!(node = %self.id(), subscriber = std::any::type_name::<T>(), registered, "Subscribed");
        Ok(registered)
    }

    /// Removes the allocation behind `subscriber` from every registry of this node.
    /// Returns the number of registrations removed.
    pub fn unsubscribe<T: ?Sized>(&self, subscriber: &Arc<T>) -> usize {
        let id = identity(subscriber);
        let removed = self.node.subscribers.remove(id) + usize::from(self.node.handlers.remove(id));
        debug!(node = %self.id(), removed, "Unsubscribed");
        removed
    }

    /// Typed publisher for event `E`, bound to this node.
    ///
    /// # Examples
    /// ```rust
    /// use arbor_event_bus::{EventBus, EventResult, EventState, dispatcher, event};
    ///
    /// #[event]
    /// pub trait Refresh {
    ///     fn refresh(&self) -> EventResult;
    /// }
    ///
    /// let root = EventBus::new_root(dispatcher::immediate());
    /// // Nobody listens, so the call passes all the way up.
    /// assert_eq!(root.publisher::<dyn Refresh>().refresh(), EventState::Passed);
    /// ```
    #[must_use]
    pub fn publisher<E: Event + ?Sized>(&self) -> E::Publisher {
        E::Publisher::from(Publisher::new(self.clone()))
    }

    /// Stops this node: later dispatches through it pass silently and its registries
    /// are emptied. Idempotent.
    pub fn shutdown(&self) {
        if self.node.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        self.clear();
        debug!(node = %self.id(), depth = self.depth(), "Bus shut down");
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.node.shutdown.load(Ordering::Acquire)
    }

    /// Offers `invocation` to this node's subscribers of `E`, escalating on `Passed`.
    pub fn dispatch_event<E: Event + ?Sized>(&self, invocation: &Invocation<E>) -> EventState {
        self.node.subscribers.dispatch(self, invocation)
    }

    /// Offers `failure` to this node's error handlers, escalating on `Passed`.
    pub fn handle_error(&self, failure: &EventFailure) -> EventState {
        self.node.handlers.handle(self, failure)
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.node.id
    }

    /// Distance from the root; the root is at depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.node.depth
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Self> {
        self.node.parent.as_ref()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.node.parent.is_none()
    }

    /// The dispatch strategy shared by the whole tree.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<dyn Dispatch> {
        &self.node.dispatcher
    }

    /// Number of subscribers registered for `E` at this node.
    #[must_use]
    pub fn subscriber_count<E: Event + ?Sized>(&self) -> usize {
        self.node.subscribers.count::<E>()
    }

    #[must_use]
    pub fn error_handler_count(&self) -> usize {
        self.node.handlers.len()
    }

    /// Whether both handles point at the same node.
    #[must_use]
    pub fn same_node(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    fn clear(&self) {
        self.node.subscribers.clear();
        self.node.handlers.clear();
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("id", &self.node.id)
            .field("depth", &self.node.depth)
            .field("parent", &self.node.parent.as_ref().map(Self::id))
            .field("shutdown", &self.is_shutdown())
            .field("subscribers", &self.node.subscribers)
            .field("handlers", &self.node.handlers)
            .finish()
    }
}
