//! # Esox ResourcePool
//!
//! Bounded, thread-safe pool of lazily created resources such as connections,
//! buffers or worker handles.
//!
//! ## Features
//!
//! - Lifecycle contract (`initialize`, `check`, `dispose`) via the [`Resource`] trait
//! - Lazy growth in configurable increments, capped at a maximum size
//! - Blocking acquire with a bounded number of growth retries and an optional timeout
//! - Background health sweeps that prune unhealthy idle resources
//! - Optional health check on every acquire
//! - Graceful, idempotent shutdown that disposes idle resources
//! - Automatic return of resources via RAII (Drop trait)
//! - Async acquire on top of tokio
//! - TOML configuration loading
//! - Metrics with Prometheus export
//!
//! ## Quick Start
//!
//! ```rust
//! use esox_resourcepool::{ObjectPool, Params, PoolConfiguration, Resource, ResourceError};
//!
//! struct Connection;
//!
//! impl Resource for Connection {
//!     fn initialize(&mut self, _: &Params) -> Result<(), ResourceError> { Ok(()) }
//!     fn check(&mut self, _: &Params) -> Result<(), ResourceError> { Ok(()) }
//!     fn dispose(&mut self, _: &Params) -> Result<(), ResourceError> { Ok(()) }
//! }
//!
//! let pool = ObjectPool::new(|| Connection, PoolConfiguration::default());
//! pool.initial();
//! {
//!     let _conn = pool.get().unwrap();
//!     // Connection automatically returned when `_conn` goes out of scope
//! }
//! pool.shutdown();
//! ```

mod pool;
mod config;
mod metrics;
mod health;
mod errors;
mod resource;
mod sweeper;

pub use pool::{ObjectPool, PooledObject};
pub use config::PoolConfiguration;
pub use metrics::PoolMetrics;
#[cfg(feature = "metrics")]
pub use metrics::MetricsExporter;
pub use health::HealthStatus;
pub use errors::{ConfigError, PoolError, PoolResult, ResourceError};
pub use resource::{Params, Resource};
