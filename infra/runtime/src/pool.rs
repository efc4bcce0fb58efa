use crate::config::PoolConfig;
use crate::error::{PoolError, PoolErrorExt};
use arbor_event_bus::{EventBusError, Task, WorkerPool};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, error, info, warn};

/// Count of unfinished tasks; `idle` is signalled when it drops to zero.
#[derive(Debug, Default)]
struct Tracker {
    pending: Mutex<usize>,
    idle: Condvar,
}

/// Decrements the pending count however the task ends (ran, panicked, or dropped unrun).
struct Pending(Arc<Tracker>);

impl Pending {
    fn track(tracker: &Arc<Tracker>) -> Self {
        *tracker.pending.lock() += 1;
        Self(Arc::clone(tracker))
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        let mut pending = self.0.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.0.idle.notify_all();
        }
    }
}

/// A [`WorkerPool`] running dispatch tasks on the blocking pool of a dedicated Tokio runtime.
///
/// Subscriber code is synchronous, so tasks go through `spawn_blocking`; the runtime's
/// blocking pool is capped at [`PoolConfig::worker_threads`].
pub struct RuntimePool {
    handle: Handle,
    runtime: Mutex<Option<Runtime>>,
    shutdown: AtomicBool,
    tracker: Arc<Tracker>,
    config: PoolConfig,
}

impl RuntimePool {
    /// Builds the runtime described by `config`.
    ///
    /// # Errors
    /// Returns [`PoolError::Runtime`] if the OS refuses to create the runtime.
    pub fn new(config: &PoolConfig) -> Result<Self, PoolError> {
        let config = config.normalized();
        debug!(config = ?config, "Building dispatch runtime");

        let mut builder = Builder::new_multi_thread();
        builder
            .worker_threads(1)
            .max_blocking_threads(config.worker_threads)
            .thread_name(&config.thread_name)
            .thread_stack_size(config.stack_size)
            .thread_keep_alive(config.keep_alive());

        let runtime = builder.build().context("Failed to initialize dispatch runtime")?;
        info!(threads = config.worker_threads, stack = config.stack_size, "Dispatch pool started");

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
            shutdown: AtomicBool::new(false),
            tracker: Arc::default(),
            config,
        })
    }

    /// Convenience for `Arc::new(RuntimePool::new(config)?)`, the shape dispatchers expect.
    ///
    /// # Errors
    /// See [`RuntimePool::new`].
    pub fn shared(config: &PoolConfig) -> Result<Arc<Self>, PoolError> {
        Self::new(config).map(Arc::new)
    }

    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Tasks submitted but not yet finished.
    #[must_use]
    pub fn pending(&self) -> usize {
        *self.tracker.pending.lock()
    }

    /// Blocks until no task is pending or `timeout` elapses. Returns `true` when idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut pending = self.tracker.pending.lock();
        while *pending > 0 {
            if self.tracker.idle.wait_until(&mut pending, deadline).timed_out() {
                return *pending == 0;
            }
        }
        true
    }

    /// Rejects further submissions and stops the runtime, waiting up to the configured grace
    /// period for running tasks. Idempotent.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        let Some(runtime) = self.runtime.lock().take() else {
            return;
        };
        let pending = self.pending();

        // Blocking shutdown is not allowed from inside a runtime (e.g. from a subscriber).
        if Handle::try_current().is_ok() {
            runtime.shutdown_background();
            warn!(pending, "Dispatch pool shut down from async context; tasks detached");
        } else {
            runtime.shutdown_timeout(self.config.shutdown_grace());
            info!(pending, "Dispatch pool shut down");
        }
    }
}

impl WorkerPool for RuntimePool {
    fn submit(&self, task: Task) -> Result<(), EventBusError> {
        if self.is_shutdown() {
            return Err(EventBusError::Shutdown {
                message: "dispatch pool is shut down".into(),
                context: Some(self.config.thread_name.clone().into()),
            });
        }

        let pending = Pending::track(&self.tracker);
        self.handle.spawn_blocking(move || {
            let _pending = pending;
            if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_owned());
                error!(panic = %message, "Dispatch task panicked");
            }
        });
        Ok(())
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

impl Drop for RuntimePool {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.get_mut().take() {
            runtime.shutdown_background();
        }
    }
}

impl fmt::Debug for RuntimePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimePool")
            .field("threads", &self.config.worker_threads)
            .field("pending", &self.pending())
            .field("shutdown", &self.is_shutdown())
            .finish_non_exhaustive()
    }
}
