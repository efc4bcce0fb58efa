use crate::bus::EventBus;
use crate::error::EventBusError;
use crate::event::{Event, Invocation};
use crate::state::EventState;
use fxhash::FxHashMap;
use parking_lot::{RwLock, RwLockWriteGuard};
use std::any::{Any, TypeId};
use std::sync::Arc;
use tracing::{error, trace, warn};

/// Subscribers of one event type at one node, keyed by allocation address.
#[derive(Debug)]
struct SubscriberSet<E: ?Sized> {
    entries: RwLock<FxHashMap<usize, Arc<E>>>,
}

impl<E: ?Sized> Default for SubscriberSet<E> {
    fn default() -> Self {
        Self { entries: RwLock::new(FxHashMap::default()) }
    }
}

impl<E: ?Sized> SubscriberSet<E> {
    fn insert(&self, id: usize, subscriber: Arc<E>) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&id) {
            return false;
        }
        entries.insert(id, subscriber);
        true
    }

    fn snapshot(&self) -> Vec<Arc<E>> {
        self.entries.read().values().cloned().collect()
    }
}

/// Type-erased view of a [`SubscriberSet`] used by operations that ignore the event type.
trait ErasedSet: Send + Sync {
    fn remove(&self, id: usize) -> bool;
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
}

impl<E: Event + ?Sized> ErasedSet for SubscriberSet<E> {
    fn remove(&self, id: usize) -> bool {
        self.entries.write().remove(&id).is_some()
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn downcast<E: Event + ?Sized>(set: &dyn ErasedSet) -> Result<&SubscriberSet<E>, EventBusError> {
    set.as_any().downcast_ref::<SubscriberSet<E>>().ok_or_else(|| EventBusError::TypeMismatch {
        message: std::any::type_name::<E>().into(),
        context: Some("Subscriber set registered under a foreign type".into()),
    })
}

/// Per-node subscriber registry: one lazily created set per event type.
#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    sets: RwLock<FxHashMap<TypeId, Box<dyn ErasedSet>>>,
}

impl SubscriberRegistry {
    /// Adds `subscriber` under event `E`. Returns `false` if it was already present.
    pub(crate) fn add<E: Event + ?Sized>(&self, id: usize, subscriber: Arc<E>) -> Result<bool, EventBusError> {
        self.with_set::<E, _>(|set| set.insert(id, subscriber))
    }

    /// Offers `invocation` to every local subscriber of `E`, then escalates to the parent.
    pub(crate) fn dispatch<E: Event + ?Sized>(&self, node: &EventBus, invocation: &Invocation<E>) -> EventState {
        if node.is_shutdown() {
            return EventState::Passed;
        }

        let subscribers = match self.lookup::<E, _>(SubscriberSet::snapshot) {
            Ok(subscribers) => subscribers.unwrap_or_default(),
            Err(err) => {
                error!(node = %node.id(), error = %err, "Subscriber registry is corrupted");
                return EventState::Passed;
            },
        };

        trace!(
            event = E::NAME,
            method = invocation.method(),
            node = %node.id(),
            depth = node.depth(),
            subscribers = subscribers.len(),
            "Dispatching event"
        );

        for subscriber in subscribers {
            if node.is_shutdown() {
                trace!(event = E::NAME, node = %node.id(), "Node shut down mid-dispatch");
                return EventState::Passed;
            }

            match invocation.invoke(&*subscriber) {
                Ok(EventState::Resolved) => return EventState::Resolved,
                Ok(EventState::Passed) => {},
                Err(failure) => {
                    warn!(node = %node.id(), error = %failure, "Subscriber failed");
                    return node.handle_error(&failure);
                },
            }
        }

        match node.parent() {
            Some(parent) if !node.is_shutdown() => parent.dispatch_event(invocation),
            _ => EventState::Passed,
        }
    }

    /// Removes `id` from every event type. Returns the number of sets it was removed from.
    pub(crate) fn remove(&self, id: usize) -> usize {
        self.sets.read().values().filter(|set| set.remove(id)).count()
    }

    pub(crate) fn count<E: Event + ?Sized>(&self) -> usize {
        self.sets.read().get(&TypeId::of::<E>()).map_or(0, |set| set.len())
    }

    pub(crate) fn clear(&self) {
        self.sets.write().clear();
    }

    /// Read-only lookup; never creates a set, so dispatching leaves no structure behind.
    fn lookup<E, R>(&self, f: impl FnOnce(&SubscriberSet<E>) -> R) -> Result<Option<R>, EventBusError>
    where
        E: Event + ?Sized,
    {
        self.sets
            .read()
            .get(&TypeId::of::<E>())
            .map(|set| downcast::<E>(set.as_ref()).map(f))
            .transpose()
    }

    /// Double-checked lookup: read lock first, then create under the write lock and downgrade.
    fn with_set<E, R>(&self, f: impl FnOnce(&SubscriberSet<E>) -> R) -> Result<R, EventBusError>
    where
        E: Event + ?Sized,
    {
        let key = TypeId::of::<E>();

        {
            let sets = self.sets.read();
            if let Some(set) = sets.get(&key) {
                return downcast::<E>(set.as_ref()).map(f);
            }
        }

        let mut sets = self.sets.write();
        sets.entry(key).or_insert_with(|| {
            trace!(event = E::NAME, "Creating subscriber set");
            Box::new(SubscriberSet::<E>::default())
        });

        let sets = RwLockWriteGuard::downgrade(sets);
        let set = sets.get(&key).ok_or_else(|| EventBusError::Internal {
            message: "subscriber set vanished after creation".into(),
            context: Some(E::NAME.into()),
        })?;
        downcast::<E>(set.as_ref()).map(f)
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry").field("event_types", &self.sets.read().len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::Publisher;
    use crate::state::EventResult;
    use std::thread;

    trait Tick: Send + Sync {
        fn tick(&self) -> EventResult;
    }

    trait Tock: Send + Sync {
        fn tock(&self) -> EventResult;
    }

    #[derive(Debug)]
    struct Unused;

    impl From<Publisher<dyn Tick>> for Unused {
        fn from(_: Publisher<dyn Tick>) -> Self {
            Self
        }
    }

    impl From<Publisher<dyn Tock>> for Unused {
        fn from(_: Publisher<dyn Tock>) -> Self {
            Self
        }
    }

    impl Event for dyn Tick {
        const NAME: &'static str = "Tick";
        type Publisher = Unused;
    }

    impl Event for dyn Tock {
        const NAME: &'static str = "Tock";
        type Publisher = Unused;
    }

    struct Clock;

    impl Tick for Clock {
        fn tick(&self) -> EventResult {
            Ok(EventState::Passed)
        }
    }

    impl Tock for Clock {
        fn tock(&self) -> EventResult {
            Ok(EventState::Passed)
        }
    }

    #[test]
    fn add_is_idempotent_per_identity() {
        let registry = SubscriberRegistry::default();
        let clock = Arc::new(Clock);

        assert!(registry.add::<dyn Tick>(1, clock.clone()).unwrap());
        assert!(!registry.add::<dyn Tick>(1, clock.clone()).unwrap());
        assert!(registry.add::<dyn Tick>(2, clock).unwrap());
        assert_eq!(registry.count::<dyn Tick>(), 2);
        assert_eq!(registry.count::<dyn Tock>(), 0);
    }

    #[test]
    fn remove_spans_event_types() {
        let registry = SubscriberRegistry::default();
        let clock = Arc::new(Clock);
        registry.add::<dyn Tick>(7, clock.clone()).unwrap();
        registry.add::<dyn Tock>(7, clock).unwrap();

        assert_eq!(registry.remove(7), 2);
        assert_eq!(registry.remove(7), 0);
        assert_eq!(registry.count::<dyn Tick>(), 0);
    }

    #[test]
    fn dispatch_does_not_create_sets() {
        let registry = SubscriberRegistry::default();
        let node = EventBus::new_root(crate::dispatcher::immediate());
        let invocation = Invocation::<dyn Tock>::new("tock", |clock| clock.tock());

        assert_eq!(registry.dispatch(&node, &invocation), EventState::Passed);
        assert!(registry.sets.read().is_empty());

        node.shutdown();
        assert_eq!(registry.dispatch(&node, &invocation), EventState::Passed);
        assert!(registry.sets.read().is_empty());
    }

    #[test]
    fn concurrent_first_use_creates_one_set() {
        let registry = Arc::new(SubscriberRegistry::default());

        let handles: Vec<_> = (0..16)
            .map(|id| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.add::<dyn Tick>(id, Arc::new(Clock)).unwrap())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        assert_eq!(registry.sets.read().len(), 1);
        assert_eq!(registry.count::<dyn Tick>(), 16);
    }

    #[test]
    fn clear_drops_every_set() {
        let registry = SubscriberRegistry::default();
        registry.add::<dyn Tock>(1, Arc::new(Clock)).unwrap();
        registry.clear();
        assert_eq!(registry.count::<dyn Tock>(), 0);
        assert_eq!(format!("{registry:?}"), "SubscriberRegistry { event_types: 0 }");
    }
}
