//! # Runtime
//!
//! The worker pool behind [`arbor_event_bus::dispatcher::worker_pool`].
//!
//! [`RuntimePool`] owns a dedicated [Tokio](https://tokio.rs) runtime and runs each dispatch
//! task on its blocking pool, so subscriber code never stalls the publishing thread.
//!
//! ## Profiles
//! * **Default**: one thread per core (or `ARBOR_POOL_THREADS`), 2 `MiB` stacks.
//! * **High Throughput**: larger stacks, long keep-alive, generous shutdown grace.
//! * **Memory Efficient**: half the cores, small stacks, threads retired quickly.
//!
//! ## Example
//!
//! ```rust
//! use arbor_event_bus::{EventBus, dispatcher};
//! use arbor_runtime::{PoolConfig, RuntimePool};
//!
//! # fn main() -> Result<(), arbor_runtime::PoolError> {
//! let pool = RuntimePool::shared(&PoolConfig::memory_efficient())?;
//! let root = EventBus::new_root(dispatcher::worker_pool(pool.clone()));
//! let _scope = root.new_child();
//! pool.shutdown();
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod pool;

pub use config::{PoolConfig, WORKER_THREADS_ENV, default_worker_threads};
pub use error::{PoolError, PoolErrorExt};
pub use pool::RuntimePool;
