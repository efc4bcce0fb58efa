use serde::Deserialize;
use std::sync::OnceLock;
use std::thread::available_parallelism;
use std::time::Duration;

/// The default number of worker threads if detection fails.
const DEFAULT_WORKER_THREADS: usize = 4;
const MAX_WORKER_THREADS: usize = 1024;
/// The default stack size for threads (2 `MiB`).
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
/// Minimum allowed stack size (256 `KiB`).
const MIN_STACK_SIZE: usize = 256 * 1024;
/// Maximum allowed stack size (16 `MiB`).
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
const DEFAULT_THREAD_NAME: &str = "arbor-dispatch";
/// How long an idle thread stays alive.
const DEFAULT_KEEP_ALIVE_SECS: u64 = 10;
const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 500;

/// Environment override for the default worker count.
pub const WORKER_THREADS_ENV: &str = "ARBOR_POOL_THREADS";

static WORKER_THREADS: OnceLock<usize> = OnceLock::new();

fn parse_worker_threads(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok()).filter(|&n| n > 0 && n <= MAX_WORKER_THREADS)
}

/// Worker count from [`WORKER_THREADS_ENV`] or the hardware, resolved once per process.
pub fn default_worker_threads() -> usize {
    *WORKER_THREADS.get_or_init(|| {
        parse_worker_threads(std::env::var(WORKER_THREADS_ENV).ok().as_deref()).unwrap_or_else(|| {
            available_parallelism().map(std::num::NonZero::get).unwrap_or(DEFAULT_WORKER_THREADS)
        })
    })
}

/// Configuration for the dispatch worker pool.
///
/// Deserializes with every field optional, e.g. from the `[pool]` table of a config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub keep_alive_secs: u64,
    /// How long [`RuntimePool::shutdown`](crate::RuntimePool::shutdown) waits for running tasks.
    pub shutdown_grace_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
        }
    }
}

impl PoolConfig {
    /// Preset for busy trees: every core, larger stacks, long-lived threads.
    #[must_use = "Use this configuration for event-heavy applications"]
    pub fn high_throughput() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            stack_size: 4 * 1024 * 1024,
            thread_name: "arbor-dispatch-hp".to_owned(),
            keep_alive_secs: 120,
            shutdown_grace_ms: 2_000,
        }
    }

    /// Preset where memory footprint matters more than latency.
    #[must_use = "Use this configuration for resource-constrained applications"]
    pub fn memory_efficient() -> Self {
        Self {
            worker_threads: (default_worker_threads() / 2).max(1),
            stack_size: 512 * 1024,
            thread_name: "arbor-dispatch-mem".to_owned(),
            keep_alive_secs: 2,
            shutdown_grace_ms: 200,
        }
    }

    #[must_use = "Customize the number of worker threads"]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.clamp(1, MAX_WORKER_THREADS);
        self
    }

    #[must_use = "Customize the stack size for worker threads"]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE);
        self
    }

    #[must_use = "Customize the thread name"]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.thread_name = if name.trim().is_empty() { DEFAULT_THREAD_NAME.to_owned() } else { name };
        self
    }

    #[must_use = "Customize how long idle threads stay alive"]
    pub const fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive_secs = keep_alive.as_secs();
        self
    }

    #[must_use = "Customize how long shutdown waits for running tasks"]
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub const fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Applies the builder clamps to values that bypassed them (deserialization, struct literals).
    #[must_use]
    pub fn normalized(&self) -> Self {
        self.clone()
            .with_worker_threads(self.worker_threads)
            .with_stack_size(self.stack_size)
            .with_thread_name(self.thread_name.clone())
    }
}
