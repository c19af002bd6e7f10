//! Metrics collection and export for resource pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// Metrics data for a pool
///
/// # Examples
///
/// ```
/// use esox_resourcepool::{ObjectPool, Params, PoolConfiguration, Resource, ResourceError};
///
/// struct Buffer;
///
/// impl Resource for Buffer {
///     fn initialize(&mut self, _: &Params) -> Result<(), ResourceError> { Ok(()) }
///     fn check(&mut self, _: &Params) -> Result<(), ResourceError> { Ok(()) }
///     fn dispose(&mut self, _: &Params) -> Result<(), ResourceError> { Ok(()) }
/// }
///
/// let pool = ObjectPool::new(|| Buffer, PoolConfiguration::default());
/// pool.initial();
///
/// let buffer = pool.get_one().unwrap();
/// let metrics = pool.get_metrics();
/// assert_eq!(metrics.total_created, 5);
/// assert_eq!(metrics.total_acquired, 1);
///
/// pool.back_one(buffer);
/// pool.shutdown();
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct PoolMetrics {
    /// Resources constructed and initialized successfully
    pub total_created: usize,

    /// Resources whose initialization failed during growth
    pub initialize_failures: usize,

    /// Resources handed out by acquire
    pub total_acquired: usize,

    /// Acquires that ended in an error
    pub acquire_failures: usize,

    /// Resources handed back to the pool
    pub total_released: usize,

    /// Resources disposed through the lifecycle contract
    pub total_disposed: usize,

    /// Dispose calls that reported an error
    pub dispose_failures: usize,

    /// Health checks that failed, during sweeps or on acquire
    pub check_failures: usize,

    /// Growth operations run to completion
    pub growth_runs: usize,

    /// Current idle resources
    pub idle_resources: usize,

    /// Maximum idle resources
    pub max_pool_size: usize,

    /// Idle fill ratio (0.0 to 1.0)
    pub fill_ratio: f64,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("initialize_failures".to_string(), self.initialize_failures.to_string());
        metrics.insert("total_acquired".to_string(), self.total_acquired.to_string());
        metrics.insert("acquire_failures".to_string(), self.acquire_failures.to_string());
        metrics.insert("total_released".to_string(), self.total_released.to_string());
        metrics.insert("total_disposed".to_string(), self.total_disposed.to_string());
        metrics.insert("dispose_failures".to_string(), self.dispose_failures.to_string());
        metrics.insert("check_failures".to_string(), self.check_failures.to_string());
        metrics.insert("growth_runs".to_string(), self.growth_runs.to_string());
        metrics.insert("idle_resources".to_string(), self.idle_resources.to_string());
        metrics.insert("max_pool_size".to_string(), self.max_pool_size.to_string());
        metrics.insert("fill_ratio".to_string(), format!("{:.2}", self.fill_ratio));
        metrics
    }
}

/// Metrics exporter for Prometheus format
#[cfg(feature = "metrics")]
pub struct MetricsExporter;

#[cfg(feature = "metrics")]
impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// Every sample carries a `pool` label plus any extra `tags`.
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> prometheus::Result<String> {
        use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Opts, Registry, TextEncoder};

        let mut labels = HashMap::new();
        labels.insert("pool".to_string(), pool_name.to_string());
        if let Some(tags) = tags {
            for (key, value) in tags {
                labels.insert(key.clone(), value.clone());
            }
        }

        let registry = Registry::new();
        let opts = |name: &str, help: &str| Opts::new(name, help).const_labels(labels.clone());

        let counters = [
            (
                "resourcepool_created_total",
                "Resources created",
                metrics.total_created,
            ),
            (
                "resourcepool_initialize_failures_total",
                "Resource initialization failures",
                metrics.initialize_failures,
            ),
            (
                "resourcepool_acquired_total",
                "Resources acquired",
                metrics.total_acquired,
            ),
            (
                "resourcepool_acquire_failures_total",
                "Failed acquires",
                metrics.acquire_failures,
            ),
            (
                "resourcepool_released_total",
                "Resources released",
                metrics.total_released,
            ),
            (
                "resourcepool_disposed_total",
                "Resources disposed",
                metrics.total_disposed,
            ),
            (
                "resourcepool_dispose_failures_total",
                "Resource dispose failures",
                metrics.dispose_failures,
            ),
            (
                "resourcepool_check_failures_total",
                "Failed health checks",
                metrics.check_failures,
            ),
            (
                "resourcepool_growth_runs_total",
                "Completed growth operations",
                metrics.growth_runs,
            ),
        ];
        for (name, help, value) in counters {
            let counter = IntCounter::with_opts(opts(name, help))?;
            counter.inc_by(value as u64);
            registry.register(Box::new(counter))?;
        }

        let idle = IntGauge::with_opts(opts(
            "resourcepool_resources_idle",
            "Current idle resources",
        ))?;
        idle.set(i64::try_from(metrics.idle_resources).unwrap_or(i64::MAX));
        registry.register(Box::new(idle))?;

        let max = IntGauge::with_opts(opts(
            "resourcepool_resources_max",
            "Maximum idle resources",
        ))?;
        max.set(i64::try_from(metrics.max_pool_size).unwrap_or(i64::MAX));
        registry.register(Box::new(max))?;

        let fill = Gauge::with_opts(opts("resourcepool_fill_ratio", "Idle fill ratio"))?;
        fill.set(metrics.fill_ratio);
        registry.register(Box::new(fill))?;

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Internal metrics tracker
#[derive(Default)]
pub(crate) struct MetricsTracker {
    pub created: AtomicUsize,
    pub initialize_failures: AtomicUsize,
    pub acquired: AtomicUsize,
    pub acquire_failures: AtomicUsize,
    pub released: AtomicUsize,
    pub disposed: AtomicUsize,
    pub dispose_failures: AtomicUsize,
    pub check_failures: AtomicUsize,
    pub growth_runs: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self, idle: usize, max_pool_size: usize) -> PoolMetrics {
        let fill_ratio = if max_pool_size > 0 {
            idle as f64 / max_pool_size as f64
        } else {
            0.0
        };

        PoolMetrics {
            total_created: self.created.load(Ordering::Relaxed),
            initialize_failures: self.initialize_failures.load(Ordering::Relaxed),
            total_acquired: self.acquired.load(Ordering::Relaxed),
            acquire_failures: self.acquire_failures.load(Ordering::Relaxed),
            total_released: self.released.load(Ordering::Relaxed),
            total_disposed: self.disposed.load(Ordering::Relaxed),
            dispose_failures: self.dispose_failures.load(Ordering::Relaxed),
            check_failures: self.check_failures.load(Ordering::Relaxed),
            growth_runs: self.growth_runs.load(Ordering::Relaxed),
            idle_resources: idle,
            max_pool_size,
            fill_ratio,
        }
    }
}
