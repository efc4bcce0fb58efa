use crate::bus::EventBus;
use crate::failure::EventFailure;
use crate::state::EventState;
use crate::subscriber::ErrorHandler;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Per-node error handlers, keyed by allocation address.
#[derive(Default)]
pub(crate) struct ErrorHandlerRegistry {
    handlers: RwLock<FxHashMap<usize, Arc<dyn ErrorHandler>>>,
}

impl ErrorHandlerRegistry {
    /// Returns `false` if `id` is already registered.
    pub(crate) fn add(&self, id: usize, handler: Arc<dyn ErrorHandler>) -> bool {
        let mut handlers = self.handlers.write();
        if handlers.contains_key(&id) {
            return false;
        }
        handlers.insert(id, handler);
        true
    }

    pub(crate) fn remove(&self, id: usize) -> bool {
        self.handlers.write().remove(&id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub(crate) fn clear(&self) {
        self.handlers.write().clear();
    }

    /// Offers `failure` to the local handlers, then to the parent's.
    ///
    /// Handlers run outside of any lock. A panicking handler unwinds into the caller.
    pub(crate) fn handle(&self, node: &EventBus, failure: &EventFailure) -> EventState {
        if node.is_shutdown() {
            return EventState::Passed;
        }

        let handlers: Vec<_> = self.handlers.read().values().cloned().collect();
        trace!(node = %node.id(), handlers = handlers.len(), origin = failure.origin(), "Handling failure");

        for handler in handlers {
            if node.is_shutdown() {
                return EventState::Passed;
            }
            if handler.on_error(failure).is_resolved() {
                return EventState::Resolved;
            }
        }

        match node.parent() {
            Some(parent) if !node.is_shutdown() => parent.handle_error(failure),
            _ => EventState::Passed,
        }
    }
}

impl fmt::Debug for ErrorHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandlerRegistry").field("handlers", &self.len()).finish()
    }
}
