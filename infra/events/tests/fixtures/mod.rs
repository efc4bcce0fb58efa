use arbor_event_bus::{
    ErrorHandler, EventBus, EventBusError, EventFailure, EventResult, EventState, Subscriber, Subscriptions, Task,
    WorkerPool, event,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};

#[event]
pub trait Navigation {
    /// Opens `route` in the nearest scope that knows it.
    fn open(&self, route: String) -> EventResult;
}

#[event(name = "Audit")]
pub trait AuditLog {
    fn record(&self, entry: String, level: u8) -> EventResult;
}

/// Shared, ordered log of which participant ran.
pub type Journal = Arc<Mutex<Vec<String>>>;

#[must_use]
pub fn journal() -> Journal {
    Arc::default()
}

#[must_use]
pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().clone()
}

/// Answers every event with a fixed state and records each call.
#[derive(Debug, Subscriber)]
#[subscriber(events(Navigation, AuditLog))]
pub struct Recorder {
    label: String,
    outcome: EventState,
    calls: AtomicUsize,
    journal: Journal,
    routes: Mutex<Vec<String>>,
}

impl Recorder {
    #[must_use]
    pub fn new(label: &str, outcome: EventState, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_owned(),
            outcome,
            calls: AtomicUsize::new(0),
            journal: Arc::clone(journal),
            routes: Mutex::default(),
        })
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().clone()
    }

    fn hit(&self) -> EventResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().push(self.label.clone());
        Ok(self.outcome)
    }
}

impl Navigation for Recorder {
    fn open(&self, route: String) -> EventResult {
        self.routes.lock().push(route);
        self.hit()
    }
}

impl AuditLog for Recorder {
    fn record(&self, _entry: String, _level: u8) -> EventResult {
        self.hit()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("route {0} is broken")]
pub struct BrokenRoute(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    Error,
    Panic,
}

/// Navigation subscriber that always fails.
#[derive(Debug, Subscriber)]
#[subscriber(events(Navigation))]
pub struct Failing {
    mode: FailureMode,
}

impl Failing {
    #[must_use]
    pub fn new(mode: FailureMode) -> Arc<Self> {
        Arc::new(Self { mode })
    }
}

impl Navigation for Failing {
    fn open(&self, route: String) -> EventResult {
        match self.mode {
            FailureMode::Error => Err(BrokenRoute(route).into()),
            FailureMode::Panic => panic!("cannot open {route}"),
        }
    }
}

/// Error handler that answers with a fixed state and keeps what it saw.
#[derive(Debug, Subscriber)]
#[subscriber(error_handler)]
pub struct Handler {
    label: String,
    outcome: EventState,
    journal: Journal,
    seen: Mutex<Vec<String>>,
    panics: AtomicUsize,
}

impl Handler {
    #[must_use]
    pub fn new(label: &str, outcome: EventState, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_owned(),
            outcome,
            journal: Arc::clone(journal),
            seen: Mutex::default(),
            panics: AtomicUsize::new(0),
        })
    }

    #[must_use]
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }

    #[must_use]
    pub fn panics(&self) -> usize {
        self.panics.load(Ordering::SeqCst)
    }
}

impl ErrorHandler for Handler {
    fn on_error(&self, failure: &EventFailure) -> EventState {
        if failure.is_panic() {
            self.panics.fetch_add(1, Ordering::SeqCst);
        }
        self.seen.lock().push(failure.to_string());
        self.journal.lock().push(self.label.clone());
        self.outcome
    }
}

/// Shuts `target` down while handling the event, then passes.
#[derive(Debug, Subscriber)]
#[subscriber(events(Navigation))]
pub struct Saboteur {
    target: EventBus,
}

impl Saboteur {
    #[must_use]
    pub fn new(target: &EventBus) -> Arc<Self> {
        Arc::new(Self { target: target.clone() })
    }
}

impl Navigation for Saboteur {
    fn open(&self, _route: String) -> EventResult {
        self.target.shutdown();
        Ok(EventState::Passed)
    }
}

/// Re-publishes every navigation as an audit entry on the same node.
#[derive(Debug, Subscriber)]
#[subscriber(events(Navigation))]
pub struct Relay {
    bus: EventBus,
    relayed: Mutex<Vec<EventState>>,
}

impl Relay {
    #[must_use]
    pub fn new(bus: &EventBus) -> Arc<Self> {
        Arc::new(Self { bus: bus.clone(), relayed: Mutex::default() })
    }

    #[must_use]
    pub fn relayed(&self) -> Vec<EventState> {
        self.relayed.lock().clone()
    }
}

impl Navigation for Relay {
    fn open(&self, route: String) -> EventResult {
        let state = self.bus.publisher::<dyn AuditLog>().record(format!("open {route}"), 1);
        self.relayed.lock().push(state);
        Ok(EventState::Passed)
    }
}

/// Navigation subscriber that blocks on a barrier before counting the call.
#[derive(Debug, Subscriber)]
#[subscriber(events(Navigation))]
pub struct Gate {
    barrier: Arc<Barrier>,
    calls: AtomicUsize,
}

impl Gate {
    #[must_use]
    pub fn new(barrier: &Arc<Barrier>) -> Arc<Self> {
        Arc::new(Self { barrier: Arc::clone(barrier), calls: AtomicUsize::new(0) })
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Navigation for Gate {
    fn open(&self, _route: String) -> EventResult {
        self.barrier.wait();
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(EventState::Resolved)
    }
}

/// Worker pool spawning one OS thread per task.
#[derive(Debug, Default)]
pub struct ThreadPool {
    shutdown: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPool {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::default()
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for every task submitted so far. Returns how many there were.
    pub fn join(&self) -> usize {
        let workers = std::mem::take(&mut *self.workers.lock());
        let count = workers.len();
        for worker in workers {
            worker.join().expect("worker thread panicked");
        }
        count
    }
}

impl WorkerPool for ThreadPool {
    fn submit(&self, task: Task) -> Result<(), EventBusError> {
        if self.is_shutdown() {
            return Err(EventBusError::Rejected { message: "pool closed".into(), context: None });
        }
        self.workers.lock().push(thread::spawn(task));
        Ok(())
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

/// Hand-written registration whose second declaration points at another allocation.
#[derive(Debug, Default)]
pub struct Misrouted {
    calls: AtomicUsize,
}

impl Misrouted {
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Navigation for Misrouted {
    fn open(&self, _route: String) -> EventResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(EventState::Resolved)
    }
}

impl Subscriber for Misrouted {
    fn subscriptions(self: Arc<Self>, subscriptions: &mut Subscriptions<'_>) {
        let stray = Recorder::new("stray", EventState::Resolved, &journal());
        subscriptions.event::<dyn Navigation>(self).event::<dyn AuditLog>(stray);
    }
}
