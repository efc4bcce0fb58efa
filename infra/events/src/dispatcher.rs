//! Dispatch strategies.
//!
//! A strategy decides *when* a publisher call reaches [`EventBus::dispatch_event`](crate::EventBus):
//! inline on the publishing thread, or later on a worker pool. It is chosen once for the
//! root and shared by every node of the tree.

use crate::bus::NodeId;
use crate::error::EventBusError;
use crate::state::EventState;
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// Unit of work handed to a [`WorkerPool`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Minimal executor contract consumed by [`WorkerPoolDispatcher`].
pub trait WorkerPool: Send + Sync + fmt::Debug + 'static {
    /// Schedules `task`. An `Err` means the task was dropped without running.
    fn submit(&self, task: Task) -> Result<(), EventBusError>;

    fn is_shutdown(&self) -> bool;
}

impl<P: WorkerPool + ?Sized> WorkerPool for Arc<P> {
    fn submit(&self, task: Task) -> Result<(), EventBusError> {
        (**self).submit(task)
    }

    fn is_shutdown(&self) -> bool {
        (**self).is_shutdown()
    }
}

/// A publisher call on its way to a node.
pub struct DispatchRequest {
    event: &'static str,
    method: &'static str,
    node: NodeId,
    run: Box<dyn FnOnce() -> EventState + Send + 'static>,
}

impl DispatchRequest {
    pub fn new<F>(event: &'static str, method: &'static str, node: NodeId, run: F) -> Self
    where
        F: FnOnce() -> EventState + Send + 'static,
    {
        Self { event, method, node, run: Box::new(run) }
    }

    #[must_use]
    pub const fn event(&self) -> &'static str {
        self.event
    }

    #[must_use]
    pub const fn method(&self) -> &'static str {
        self.method
    }

    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Delivers the call to its node and returns the real outcome.
    pub fn run(self) -> EventState {
        (self.run)()
    }
}

impl fmt::Debug for DispatchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRequest")
            .field("event", &self.event)
            .field("method", &self.method)
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

/// Execution policy for dispatch requests.
pub trait Dispatch: Send + Sync + fmt::Debug + 'static {
    /// Runs or schedules `request`, returning the state the publisher observes.
    fn dispatch(&self, request: DispatchRequest) -> EventState;
}

/// Runs every request on the publishing thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl Dispatch for Immediate {
    fn dispatch(&self, request: DispatchRequest) -> EventState {
        request.run()
    }
}

/// Hands every request to a worker pool and reports `Resolved` once it is accepted.
///
/// The publisher never observes the real outcome. A shut-down pool, or one that rejects
/// the task, yields `Passed` and nothing runs.
pub struct WorkerPoolDispatcher<P> {
    pool: P,
}

impl<P: WorkerPool> WorkerPoolDispatcher<P> {
    pub const fn new(pool: P) -> Self {
        Self { pool }
    }

    pub const fn pool(&self) -> &P {
        &self.pool
    }
}

impl<P: WorkerPool> Dispatch for WorkerPoolDispatcher<P> {
    fn dispatch(&self, request: DispatchRequest) -> EventState {
        if self.pool.is_shutdown() {
            trace!(event = request.event(), method = request.method(), "Worker pool is shut down");
            return EventState::Passed;
        }

        let (event, method, node) = (request.event(), request.method(), request.node());
        match self.pool.submit(Box::new(move || {
            request.run();
        })) {
            Ok(()) => EventState::Resolved,
            Err(err) => {
                warn!(event, method, node = %node, error = %err, "Worker pool rejected dispatch");
                EventState::Passed
            },
        }
    }
}

impl<P: WorkerPool> fmt::Debug for WorkerPoolDispatcher<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPoolDispatcher").field("pool", &self.pool).finish()
    }
}

/// Shared [`Immediate`] strategy.
#[must_use]
pub fn immediate() -> Arc<dyn Dispatch> {
    Arc::new(Immediate)
}

/// Shared [`WorkerPoolDispatcher`] over `pool`.
pub fn worker_pool<P: WorkerPool>(pool: P) -> Arc<dyn Dispatch> {
    Arc::new(WorkerPoolDispatcher::new(pool))
}
