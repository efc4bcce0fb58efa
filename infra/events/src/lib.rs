//! # Event Bus
//!
//! A hierarchical, in-process publish/subscribe bus for nested scopes.
//!
//! ## Overview
//!
//! Bus nodes form a tree that is navigable only upward. Each node owns a registry of
//! subscribers per event trait and a registry of error handlers. A call on a publisher
//! is offered to the subscribers of its node first; when nobody resolves it, the same
//! invocation escalates to the parent node, and so on up to the root. A narrow scope can
//! therefore intercept an event meant for a broader one without either knowing the other.
//!
//! ## Features
//!
//! * **Typed events**: an event is a trait marked with [`event`]; its publisher is generated.
//! * **Escalation**: deepest node first, root last, stopping at the first [`EventState::Resolved`].
//! * **Failure routing**: subscriber errors and panics go to [`ErrorHandler`]s with the
//!   same local-first escalation; publishers only ever observe an [`EventState`].
//! * **Pluggable dispatch**: run inline ([`dispatcher::immediate`]) or on a worker pool
//!   ([`dispatcher::worker_pool`]).
//! * **Concurrency**: `FxHashMap` registries behind `parking_lot::RwLock`.
//!
//! # Example
//!
//! ```rust
//! use arbor_event_bus::{EventBus, EventResult, EventState, Subscriber, dispatcher, event};
//! use std::sync::Arc;
//!
//! #[event]
//! pub trait Navigation {
//!     fn open(&self, route: String) -> EventResult;
//! }
//!
//! #[derive(Subscriber)]
//! #[subscriber(events(Navigation))]
//! struct Router;
//!
//! impl Navigation for Router {
//!     fn open(&self, route: String) -> EventResult {
//!         Ok(EventState::resolved_if(route.starts_with('/')))
//!     }
//! }
//!
//! # fn main() -> Result<(), arbor_event_bus::EventBusError> {
//! let root = EventBus::new_root(dispatcher::immediate());
//! root.subscribe(Arc::new(Router))?;
//!
//! let child = root.new_child();
//! let navigation = child.publisher::<dyn Navigation>();
//! assert_eq!(navigation.open("/settings".to_owned()), EventState::Resolved);
//! assert_eq!(navigation.open("settings".to_owned()), EventState::Passed);
//! # Ok(())
//! # }
//! ```

mod bus;
pub mod dispatcher;
mod error;
mod event;
mod failure;
mod handlers;
mod publisher;
mod registry;
mod state;
mod subscriber;

pub use arbor_derive::{Subscriber, event};
pub use bus::{EventBus, NodeId};
pub use dispatcher::{Dispatch, DispatchRequest, Immediate, Task, WorkerPool, WorkerPoolDispatcher};
pub use error::{EventBusError, EventBusErrorExt};
pub use event::{Event, Invocation};
pub use failure::{EventFailure, EventFailureExt};
pub use publisher::Publisher;
pub use state::{BoxError, EventResult, EventState};
pub use subscriber::{ErrorHandler, Subscriber, Subscriptions};
