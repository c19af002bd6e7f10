//! Core resource pool implementation

use crate::config::PoolConfiguration;
use crate::errors::{ConfigError, PoolError, PoolResult};
use crate::health::HealthStatus;
use crate::metrics::{MetricsTracker, PoolMetrics};
use crate::resource::Resource;
use crate::sweeper::Sweeper;

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::{HashMap, VecDeque};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// A pooled resource that automatically returns to the pool when dropped
pub struct PooledObject<R: Resource> {
    value: Option<R>,
    pool: Arc<Shared<R>>,
}

impl<R: Resource> PooledObject<R> {
    /// Take the resource out without returning it to the pool
    pub fn detach(mut self) -> R {
        self.value.take().expect("Value already taken")
    }
}

impl<R: Resource> Deref for PooledObject<R> {
    type Target = R;

    fn deref(&self) -> &Self::Target {
        self.value.as_ref().expect("Value already taken")
    }
}

impl<R: Resource> DerefMut for PooledObject<R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().expect("Value already taken")
    }
}

impl<R: Resource> Drop for PooledObject<R> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.release(value);
        }
    }
}

/// Everything guarded by the pool lock
struct PoolState<R> {
    idle: VecDeque<R>,
    shutdown: bool,
    growth_in_flight: usize,
    growth_completed: u64,
}

/// Settles the in-flight bookkeeping when a growth ends, panics included
struct GrowthGuard<'a, R: Resource> {
    shared: &'a Shared<R>,
}

impl<R: Resource> Drop for GrowthGuard<'_, R> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("growth panicked");
        }
        let mut state = self.shared.state.lock();
        Shared::<R>::finish_growth(&mut state);
        drop(state);
        self.shared.changed.notify_all();
    }
}

/// State shared between the pool handle, growth threads and the sweeper
pub(crate) struct Shared<R: Resource> {
    state: Mutex<PoolState<R>>,
    changed: Condvar,
    factory: Box<dyn Fn() -> R + Send + Sync>,
    config: PoolConfiguration,
    metrics: MetricsTracker,
}

impl<R: Resource> Shared<R> {
    /// Run a growth of `count` on its own thread
    ///
    /// The caller holds the lock, so the new thread cannot make progress
    /// before the caller waits or unlocks.
    fn spawn_growth(self: &Arc<Self>, state: &mut PoolState<R>, count: usize) {
        state.growth_in_flight += 1;
        let shared = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("resourcepool-grow".to_string())
            .spawn(move || shared.run_growth(count));

        if let Err(e) = spawned {
            error!(error = %e, "failed to spawn growth thread");
            Self::finish_growth(state);
            self.changed.notify_all();
        }
    }

    fn run_growth(&self, count: usize) {
        let _settle = GrowthGuard { shared: self };
        let mut state = self.state.lock();
        self.grow(&mut state, count);
    }

    fn finish_growth(state: &mut PoolState<R>) {
        state.growth_in_flight = state.growth_in_flight.saturating_sub(1);
        state.growth_completed += 1;
    }

    /// Grow synchronously, outside the in-flight bookkeeping
    #[cfg(test)]
    fn extend(&self, count: usize) {
        let mut state = self.state.lock();
        self.grow(&mut state, count);
        drop(state);
        self.changed.notify_all();
    }

    fn grow(&self, state: &mut PoolState<R>, count: usize) {
        if state.shutdown {
            debug!(count, "pool has been shut down, skipping growth");
            return;
        }
        debug!(count, idle = state.idle.len(), "extending pool");

        for _ in 0..count {
            if state.idle.len() >= self.config.max_pool_size {
                break;
            }
            let mut resource = (self.factory)();
            match resource.initialize(&self.config.params) {
                Ok(()) => {
                    state.idle.push_back(resource);
                    MetricsTracker::incr(&self.metrics.created);
                }
                Err(e) => {
                    error!(error = %e, "resource initialization failed");
                    MetricsTracker::incr(&self.metrics.initialize_failures);
                }
            }
        }

        MetricsTracker::incr(&self.metrics.growth_runs);
        debug!(idle = state.idle.len(), "pool extended");
    }

    pub(crate) fn acquire(self: &Arc<Self>) -> PoolResult<R> {
        let result = self.take();
        match &result {
            Ok(_) => MetricsTracker::incr(&self.metrics.acquired),
            Err(e) => {
                MetricsTracker::incr(&self.metrics.acquire_failures);
                debug!(error = %e, "acquire failed");
            }
        }
        result
    }

    fn take(self: &Arc<Self>) -> PoolResult<R> {
        let mut state = self.state.lock();
        if state.shutdown {
            return Err(PoolError::Shutdown);
        }

        let timeout = self.config.acquire_timeout();
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut attempts = 0;

        let mut resource = loop {
            if let Some(resource) = state.idle.pop_front() {
                break resource;
            }
            if attempts >= self.config.acquire_retry_attempts {
                warn!(attempts, "pool exhausted, giving up");
                return Err(PoolError::CannotAcquire { attempts });
            }
            attempts += 1;

            let seen = state.growth_completed;
            self.spawn_growth(&mut state, self.config.acquire_increment);
            while state.idle.is_empty() && !state.shutdown && state.growth_completed == seen {
                match (deadline, timeout) {
                    (Some(deadline), Some(timeout)) => {
                        let timed_out = self.changed.wait_until(&mut state, deadline).timed_out();
                        if timed_out && state.idle.is_empty() && !state.shutdown {
                            warn!(?timeout, attempts, "acquire timed out");
                            return Err(PoolError::Timeout(timeout));
                        }
                    }
                    _ => self.changed.wait(&mut state),
                }
            }
            if state.shutdown {
                return Err(PoolError::Shutdown);
            }
        };

        if state.idle.len() < self.config.min_pool_size {
            debug!(idle = state.idle.len(), "idle count below minimum");
            self.spawn_growth(&mut state, self.config.acquire_increment);
        }

        if self.config.test_on_get_item {
            if let Err(e) = resource.check(&self.config.params) {
                warn!(error = %e, "resource failed health check on acquire");
                MetricsTracker::incr(&self.metrics.check_failures);
                self.discard(resource);
                return Err(PoolError::HealthCheck(e));
            }
        }

        Ok(resource)
    }

    pub(crate) fn release(&self, resource: R) {
        let mut state = self.state.lock();
        MetricsTracker::incr(&self.metrics.released);

        if state.shutdown {
            self.dispose(resource, "release after shutdown");
            return;
        }
        if state.idle.len() >= self.config.max_pool_size {
            self.dispose(resource, "release at capacity");
            return;
        }

        state.idle.push_back(resource);
        drop(state);
        self.changed.notify_all();
    }

    /// Check every idle resource, removing the ones that fail
    pub(crate) fn sweep(&self) -> usize {
        let mut state = self.state.lock();
        if state.shutdown {
            return 0;
        }
        debug!(idle = state.idle.len(), "health sweep started");

        let mut kept = VecDeque::with_capacity(state.idle.len());
        let mut removed = 0;
        while let Some(mut resource) = state.idle.pop_front() {
            match resource.check(&self.config.params) {
                Ok(()) => kept.push_back(resource),
                Err(e) => {
                    warn!(error = %e, "removing unhealthy resource");
                    MetricsTracker::incr(&self.metrics.check_failures);
                    self.discard(resource);
                    removed += 1;
                }
            }
        }
        state.idle = kept;

        debug!(idle = state.idle.len(), removed, "health sweep finished");
        removed
    }

    /// Mark the pool shut down, drain it and wait for in-flight growth
    fn shutdown(&self) {
        let mut state = self.state.lock();
        if !state.shutdown {
            info!(idle = state.idle.len(), "shutting down pool");
            state.shutdown = true;
            while let Some(resource) = state.idle.pop_front() {
                self.dispose(resource, "shutdown");
            }
        }
        self.changed.notify_all();

        while state.growth_in_flight > 0 {
            self.changed.wait(&mut state);
        }
        debug!("pool shut down");
    }

    /// Drop a resource that failed its health check
    fn discard(&self, resource: R) {
        if self.config.dispose_on_check_failure {
            self.dispose(resource, "health check failure");
        }
    }

    fn dispose(&self, mut resource: R, context: &'static str) {
        MetricsTracker::incr(&self.metrics.disposed);
        if let Err(e) = resource.dispose(&self.config.params) {
            MetricsTracker::incr(&self.metrics.dispose_failures);
            error!(error = %e, context, "resource dispose failed");
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState<R>> {
        self.state.lock()
    }
}

/// Thread-safe pool of lazily created, health-checked resources
///
/// # Examples
///
/// ```
/// use esox_resourcepool::{ObjectPool, Params, PoolConfiguration, Resource, ResourceError};
///
/// struct Worker;
///
/// impl Resource for Worker {
///     fn initialize(&mut self, _: &Params) -> Result<(), ResourceError> { Ok(()) }
///     fn check(&mut self, _: &Params) -> Result<(), ResourceError> { Ok(()) }
///     fn dispose(&mut self, _: &Params) -> Result<(), ResourceError> { Ok(()) }
/// }
///
/// let pool = ObjectPool::new(|| Worker, PoolConfiguration::default());
/// pool.initial();
/// assert_eq!(pool.idle_count(), 5);
///
/// let worker = pool.get_one().unwrap();
/// pool.back_one(worker);
///
/// {
///     let _worker = pool.get().unwrap();
///     // Returned when `_worker` goes out of scope
/// }
///
/// pool.shutdown();
/// assert!(pool.get_one().is_err());
/// ```
pub struct ObjectPool<R: Resource> {
    shared: Arc<Shared<R>>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl<R: Resource> ObjectPool<R> {
    /// Create an empty pool; call [`initial`](Self::initial) to populate it
    pub fn new<F>(factory: F, config: PoolConfiguration) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(PoolState {
                    idle: VecDeque::new(),
                    shutdown: false,
                    growth_in_flight: 0,
                    growth_completed: 0,
                }),
                changed: Condvar::new(),
                factory: Box::new(factory),
                config,
                metrics: MetricsTracker::new(),
            }),
            sweeper: Mutex::new(None),
        }
    }

    /// Create an empty pool after validating the configuration
    pub fn try_new<F>(factory: F, config: PoolConfiguration) -> Result<Self, ConfigError>
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        config.validate()?;
        Ok(Self::new(factory, config))
    }

    /// Create an empty pool with the default configuration
    pub fn with_defaults<F>(factory: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self::new(factory, PoolConfiguration::default())
    }

    /// Populate the pool and start the background health sweeper
    ///
    /// Blocks until the first growth of `initial_pool_size` has finished.
    pub fn initial(&self) {
        debug!(config = %self.shared.config, "initializing pool");
        {
            let mut state = self.shared.lock();
            if state.shutdown {
                debug!("pool has been shut down, skipping initialization");
                return;
            }
            self.shared.spawn_growth(&mut state, self.shared.config.initial_pool_size);
            while state.growth_in_flight > 0 {
                self.shared.changed.wait(&mut state);
            }
        }

        let mut sweeper = self.sweeper.lock();
        // A concurrent shutdown may have run while we waited for growth
        if sweeper.is_none() && !self.is_shutdown() {
            match Sweeper::start(Arc::downgrade(&self.shared), self.shared.config.test_duration()) {
                Ok(started) => *sweeper = Some(started),
                Err(e) => error!(error = %e, "failed to start health sweeper"),
            }
        }
        info!(idle = self.idle_count(), "pool initialized");
    }

    /// Get a resource from the pool (blocking)
    ///
    /// An empty pool is grown in the background up to
    /// `acquire_retry_attempts` times before the call gives up.
    pub fn get_one(&self) -> PoolResult<R> {
        self.shared.acquire()
    }

    /// Get a resource that returns itself to the pool when dropped
    pub fn get(&self) -> PoolResult<PooledObject<R>> {
        let value = self.shared.acquire()?;
        Ok(PooledObject {
            value: Some(value),
            pool: Arc::clone(&self.shared),
        })
    }

    /// Get a resource without blocking the async runtime
    pub async fn get_one_async(&self) -> PoolResult<R> {
        let shared = Arc::clone(&self.shared);
        tokio::task::spawn_blocking(move || shared.acquire())
            .await
            .map_err(|_| PoolError::Cancelled)?
    }

    /// Give a resource back to the pool
    ///
    /// A pool already at `max_pool_size`, or one that has been shut down,
    /// disposes the resource instead.
    pub fn back_one(&self, resource: R) {
        self.shared.release(resource);
    }

    /// Shut the pool down, disposing every idle resource
    ///
    /// Waits for in-flight growth and stops the health sweeper. Calling it
    /// again is a no-op.
    pub fn shutdown(&self) {
        self.shared.shutdown();
        if let Some(sweeper) = self.sweeper.lock().take() {
            sweeper.stop();
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shutdown(&self) -> bool {
        self.shared.lock().shutdown
    }

    /// Get idle count
    pub fn idle_count(&self) -> usize {
        self.shared.lock().idle.len()
    }

    /// The configuration this pool was created with
    pub fn config(&self) -> &PoolConfiguration {
        &self.shared.config
    }

    /// Get health status
    pub fn get_health_status(&self) -> HealthStatus {
        let (idle, shutdown) = {
            let state = self.shared.lock();
            (state.idle.len(), state.shutdown)
        };
        HealthStatus::new(
            idle,
            self.shared.config.min_pool_size,
            self.shared.config.max_pool_size,
            shutdown,
        )
    }

    /// Get pool metrics
    pub fn get_metrics(&self) -> PoolMetrics {
        self.shared
            .metrics
            .get_metrics(self.idle_count(), self.shared.config.max_pool_size)
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.get_metrics().export()
    }

    /// Export metrics in Prometheus format
    #[cfg(feature = "metrics")]
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> prometheus::Result<String> {
        crate::metrics::MetricsExporter::export_prometheus(&self.get_metrics(), pool_name, tags)
    }
}

impl<R: Resource> Drop for ObjectPool<R> {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.get_mut().take() {
            sweeper.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ResourceError;
    use crate::resource::Params;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Counters {
        initialized: AtomicUsize,
        checked: AtomicUsize,
        disposed: AtomicUsize,
    }

    struct TestItem {
        counters: Arc<Counters>,
    }

    fn fail_with(params: &Params, key: &str) -> Result<(), ResourceError> {
        match params.get(key) {
            Some(msg) => Err(ResourceError::new(msg.clone())),
            None => Ok(()),
        }
    }

    impl Resource for TestItem {
        fn initialize(&mut self, params: &Params) -> Result<(), ResourceError> {
            self.counters.initialized.fetch_add(1, Ordering::SeqCst);
            if let Some(msg) = params.get("InitPanic") {
                panic!("{msg}");
            }
            fail_with(params, "InitError")
        }

        fn check(&mut self, params: &Params) -> Result<(), ResourceError> {
            self.counters.checked.fetch_add(1, Ordering::SeqCst);
            fail_with(params, "CheckError")
        }

        fn dispose(&mut self, params: &Params) -> Result<(), ResourceError> {
            self.counters.disposed.fetch_add(1, Ordering::SeqCst);
            fail_with(params, "DisposeError")
        }
    }

    fn test_pool(config: PoolConfiguration) -> (ObjectPool<TestItem>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let shared = Arc::clone(&counters);
        let pool = ObjectPool::new(
            move || TestItem {
                counters: Arc::clone(&shared),
            },
            config,
        );
        (pool, counters)
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        condition()
    }

    #[test]
    fn test_initial() {
        let (pool, counters) = test_pool(PoolConfiguration::default());
        pool.initial();

        assert_eq!(pool.idle_count(), 5);
        assert_eq!(counters.initialized.load(Ordering::SeqCst), 5);
        assert!(pool.get_health_status().is_healthy());
    }

    #[test]
    fn test_initial_capped_by_max_pool_size() {
        let config = PoolConfiguration::new()
            .with_initial_pool_size(20)
            .with_max_pool_size(15);
        let (pool, _) = test_pool(config);
        pool.initial();

        assert_eq!(pool.idle_count(), 15);
    }

    #[test]
    fn test_initial_with_init_error() {
        let config = PoolConfiguration::new().with_param("InitError", "Testing");
        let (pool, _) = test_pool(config);
        pool.initial();

        assert_eq!(pool.idle_count(), 0);
        assert_eq!(
            pool.get_one().err(),
            Some(PoolError::CannotAcquire { attempts: 5 })
        );
        let metrics = pool.get_metrics();
        assert_eq!(metrics.total_created, 0);
        assert_eq!(metrics.initialize_failures, 30);
        assert_eq!(metrics.acquire_failures, 1);
    }

    #[test]
    fn test_extend() {
        let (pool, _) = test_pool(PoolConfiguration::default());
        pool.shared.extend(5);
        assert_eq!(pool.idle_count(), 5);
    }

    #[test]
    fn test_extend_over_max_pool_size() {
        let (pool, _) = test_pool(PoolConfiguration::default());
        pool.shared.extend(16);
        assert_eq!(pool.idle_count(), 15);

        pool.shared.extend(3);
        assert_eq!(pool.idle_count(), 15);
    }

    #[test]
    fn test_extend_with_shutdown() {
        let (pool, _) = test_pool(PoolConfiguration::default());
        pool.initial();
        pool.shutdown();

        pool.shared.extend(15);
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn test_get_one() {
        let (pool, _) = test_pool(PoolConfiguration::default());
        pool.initial();

        let item = pool.get_one();
        assert!(item.is_ok());
        assert_eq!(pool.idle_count(), 4);
        assert_eq!(pool.get_metrics().total_acquired, 1);
    }

    #[test]
    fn test_get_one_grows_below_min_pool_size() {
        let (pool, _) = test_pool(PoolConfiguration::default());
        pool.initial();

        let held: Vec<_> = (0..4).map(|_| pool.get_one().unwrap()).collect();
        assert_eq!(held.len(), 4);

        // 5 - 4 = 1 is below the minimum of 2, so one growth of 5 follows
        assert!(wait_for(|| pool.idle_count() == 6));
        assert!(wait_for(|| pool.get_metrics().growth_runs == 2));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(pool.idle_count(), 6);
    }

    #[test]
    fn test_get_one_grows_empty_pool() {
        let config = PoolConfiguration::new().with_initial_pool_size(0);
        let (pool, _) = test_pool(config);
        pool.initial();
        assert_eq!(pool.idle_count(), 0);

        assert!(pool.get_one().is_ok());
        assert_eq!(pool.idle_count(), 4);
    }

    #[test]
    fn test_get_one_with_zero_retry_attempts() {
        let config = PoolConfiguration::new()
            .with_initial_pool_size(0)
            .with_acquire_retry_attempts(0);
        let (pool, counters) = test_pool(config);

        assert_eq!(
            pool.get_one().err(),
            Some(PoolError::CannotAcquire { attempts: 0 })
        );
        assert_eq!(counters.initialized.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_get_one_times_out() {
        let config = PoolConfiguration::new()
            .with_initial_pool_size(0)
            .with_acquire_increment(1)
            .with_acquire_retry_attempts(100)
            .with_acquire_timeout(Duration::from_millis(150))
            .with_param("InitError", "Testing");
        let counters = Arc::new(Counters::default());
        let shared = Arc::clone(&counters);
        let pool = ObjectPool::new(
            move || {
                thread::sleep(Duration::from_millis(100));
                TestItem {
                    counters: Arc::clone(&shared),
                }
            },
            config,
        );

        assert_eq!(
            pool.get_one().err(),
            Some(PoolError::Timeout(Duration::from_millis(150)))
        );
        pool.shutdown();
    }

    #[test]
    fn test_get_one_with_health_check_error() {
        let config = PoolConfiguration::new()
            .with_test_on_get_item(true)
            .with_param("CheckError", "Testing");
        let (pool, counters) = test_pool(config);
        pool.initial();

        assert_eq!(
            pool.get_one().err(),
            Some(PoolError::HealthCheck(ResourceError::new("Testing")))
        );
        assert_eq!(pool.idle_count(), 4);
        assert_eq!(counters.disposed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_get_one_disposes_unhealthy_when_configured() {
        let config = PoolConfiguration::new()
            .with_test_on_get_item(true)
            .with_dispose_on_check_failure(true)
            .with_param("CheckError", "Testing");
        let (pool, counters) = test_pool(config);
        pool.initial();

        assert!(matches!(pool.get_one(), Err(PoolError::HealthCheck(_))));
        assert_eq!(counters.disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_back_one() {
        let (pool, _) = test_pool(PoolConfiguration::default());
        pool.initial();

        let item = pool.get_one().unwrap();
        assert_eq!(pool.idle_count(), 4);
        pool.back_one(item);
        assert_eq!(pool.idle_count(), 5);
        assert_eq!(pool.get_metrics().total_released, 1);
    }

    #[test]
    fn test_back_one_at_capacity_disposes() {
        let config = PoolConfiguration::new().with_param("DisposeError", "Testing");
        let (pool, counters) = test_pool(config);
        pool.initial();

        for _ in 0..10 {
            pool.back_one(TestItem {
                counters: Arc::clone(&counters),
            });
        }
        assert_eq!(pool.idle_count(), 15);
        assert_eq!(counters.disposed.load(Ordering::SeqCst), 0);

        pool.back_one(TestItem {
            counters: Arc::clone(&counters),
        });
        assert_eq!(pool.idle_count(), 15);
        assert_eq!(counters.disposed.load(Ordering::SeqCst), 1);
        assert_eq!(pool.get_metrics().dispose_failures, 1);
    }

    #[test]
    fn test_shutdown() {
        let (pool, counters) = test_pool(PoolConfiguration::default());
        pool.initial();
        pool.shutdown();

        assert!(pool.is_shutdown());
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(counters.disposed.load(Ordering::SeqCst), 5);
        assert_eq!(pool.get_one().err(), Some(PoolError::Shutdown));
        assert!(!pool.get_health_status().is_healthy());

        // Idempotent
        pool.shutdown();
        assert_eq!(counters.disposed.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_shutdown_with_dispose_error() {
        let config = PoolConfiguration::new().with_param("DisposeError", "Testing");
        let (pool, counters) = test_pool(config);
        pool.initial();
        pool.shutdown();

        assert_eq!(pool.idle_count(), 0);
        assert_eq!(counters.disposed.load(Ordering::SeqCst), 5);
        assert_eq!(pool.get_metrics().dispose_failures, 5);
    }

    #[test]
    fn test_panicking_initialize_does_not_block() {
        let config = PoolConfiguration::new().with_param("InitPanic", "Testing");
        let (pool, counters) = test_pool(config);
        let pool = Arc::new(pool);

        let (done, finished) = crossbeam::channel::bounded(1);
        {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                pool.initial();
                let acquired = pool.get_one();
                pool.shutdown();
                let _ = done.send(acquired);
            });
        }

        let acquired = finished
            .recv_timeout(Duration::from_secs(5))
            .expect("initial, get_one and shutdown should all return");
        assert_eq!(acquired.err(), Some(PoolError::CannotAcquire { attempts: 5 }));
        assert!(pool.is_shutdown());
        assert_eq!(pool.idle_count(), 0);
        // One panicking initialize per growth: initial plus five retries
        assert_eq!(counters.initialized.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_initial_after_shutdown_starts_no_sweeper() {
        let (pool, _) = test_pool(PoolConfiguration::default());
        pool.initial();
        assert!(pool.sweeper.lock().is_some());

        pool.shutdown();
        assert!(pool.sweeper.lock().is_none());

        pool.initial();
        assert!(pool.sweeper.lock().is_none());
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn test_back_one_after_shutdown_disposes() {
        let (pool, counters) = test_pool(PoolConfiguration::default());
        pool.initial();
        let item = pool.get_one().unwrap();
        pool.shutdown();

        pool.back_one(item);
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(counters.disposed.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_shutdown_wakes_and_fails_waiters() {
        let config = PoolConfiguration::new()
            .with_initial_pool_size(0)
            .with_acquire_increment(1)
            .with_param("InitError", "Testing");
        let counters = Arc::new(Counters::default());
        let shared = Arc::clone(&counters);
        let pool = Arc::new(ObjectPool::new(
            move || {
                thread::sleep(Duration::from_millis(50));
                TestItem {
                    counters: Arc::clone(&shared),
                }
            },
            config,
        ));

        let waiter = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.get_one())
        };
        thread::sleep(Duration::from_millis(20));
        pool.shutdown();

        let result = waiter.join().unwrap();
        assert!(matches!(
            result,
            Err(PoolError::Shutdown) | Err(PoolError::CannotAcquire { .. })
        ));
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn test_check_available() {
        let (pool, counters) = test_pool(PoolConfiguration::default());
        pool.shared.extend(5);

        assert_eq!(pool.shared.sweep(), 0);
        assert_eq!(pool.idle_count(), 5);
        assert_eq!(counters.checked.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_check_available_with_error() {
        let config = PoolConfiguration::new()
            .with_test_on_get_item(true)
            .with_param("CheckError", "Testing");
        let (pool, counters) = test_pool(config);
        pool.shared.extend(5);

        assert_eq!(pool.shared.sweep(), 5);
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(counters.disposed.load(Ordering::SeqCst), 0);

        assert_eq!(
            pool.get_one().err(),
            Some(PoolError::HealthCheck(ResourceError::new("Testing")))
        );
    }

    #[test]
    fn test_check_available_disposes_when_configured() {
        let config = PoolConfiguration::new()
            .with_dispose_on_check_failure(true)
            .with_param("CheckError", "Testing");
        let (pool, counters) = test_pool(config);
        pool.shared.extend(3);

        assert_eq!(pool.shared.sweep(), 3);
        assert_eq!(counters.disposed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_check_available_with_shutdown() {
        let config = PoolConfiguration::new().with_param("CheckError", "Testing");
        let (pool, counters) = test_pool(config);
        pool.shared.extend(5);
        pool.shutdown();

        assert_eq!(pool.shared.sweep(), 0);
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(counters.checked.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_background_sweep() {
        let config = PoolConfiguration::new()
            .with_test_duration(Duration::from_millis(20))
            .with_param("CheckError", "Testing");
        let (pool, counters) = test_pool(config);
        pool.initial();

        assert!(wait_for(|| pool.idle_count() == 0));
        assert_eq!(counters.disposed.load(Ordering::SeqCst), 0);
        pool.shutdown();
    }

    #[test]
    fn test_pooled_object() {
        let (pool, _) = test_pool(PoolConfiguration::default());
        pool.initial();

        {
            let item = pool.get().unwrap();
            assert_eq!(item.counters.initialized.load(Ordering::SeqCst), 5);
            assert_eq!(pool.idle_count(), 4);
        }
        assert_eq!(pool.idle_count(), 5);

        let detached = pool.get().unwrap().detach();
        assert_eq!(pool.idle_count(), 4);
        pool.back_one(detached);
        assert_eq!(pool.idle_count(), 5);
    }

    #[test]
    fn test_concurrent_get_and_back() {
        let (pool, _) = test_pool(PoolConfiguration::default());
        let pool = Arc::new(pool);
        pool.initial();

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let item = pool.get_one()?;
                        pool.back_one(item);
                    }
                    Ok::<_, PoolError>(())
                })
            })
            .collect();

        for worker in workers {
            assert!(worker.join().unwrap().is_ok());
        }
        assert!(pool.idle_count() <= 15);
        assert_eq!(pool.get_metrics().total_acquired, 800);
        pool.shutdown();
    }

    #[tokio::test]
    async fn test_get_one_async() {
        let (pool, _) = test_pool(PoolConfiguration::default());
        pool.initial();

        let item = pool.get_one_async().await.unwrap();
        assert_eq!(pool.idle_count(), 4);
        pool.back_one(item);
        pool.shutdown();
    }

    #[test]
    fn test_try_new_rejects_invalid_config() {
        let config = PoolConfiguration::new().with_min_pool_size(20);
        let result = ObjectPool::try_new(
            || TestItem {
                counters: Arc::new(Counters::default()),
            },
            config,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
