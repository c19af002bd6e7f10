//! Health monitoring for resource pools

/// Health status of a resource pool
///
/// # Examples
///
/// ```
/// use esox_resourcepool::HealthStatus;
///
/// let health = HealthStatus::new(5, 2, 15, false);
/// assert!(health.is_healthy());
/// assert_eq!(health.idle_resources, 5);
///
/// let starved = HealthStatus::new(1, 2, 15, false);
/// assert!(!starved.is_healthy());
/// ```
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Whether the pool is healthy
    pub is_healthy: bool,

    /// Number of warnings detected
    pub warning_count: usize,

    /// Idle fill ratio (0.0 to 1.0)
    pub fill_ratio: f64,

    /// Idle resources count
    pub idle_resources: usize,

    /// Configured minimum idle count
    pub min_pool_size: usize,

    /// Configured maximum idle count
    pub max_pool_size: usize,

    /// Whether the pool has been shut down
    pub is_shutdown: bool,

    /// Warning messages
    pub warnings: Vec<String>,
}

impl HealthStatus {
    /// Create a new health status
    pub fn new(idle: usize, min_pool_size: usize, max_pool_size: usize, is_shutdown: bool) -> Self {
        let fill_ratio = if max_pool_size > 0 {
            idle as f64 / max_pool_size as f64
        } else {
            0.0
        };

        let mut warnings = Vec::new();
        let mut is_healthy = true;

        if is_shutdown {
            warnings.push("Pool has been shut down".to_string());
            is_healthy = false;
        } else if idle < min_pool_size {
            warnings.push(format!(
                "Idle resources below minimum: {idle} < {min_pool_size}"
            ));
            is_healthy = false;
        }

        if idle == 0 && !is_shutdown {
            warnings.push("Pool is empty".to_string());
        }

        Self {
            is_healthy,
            warning_count: warnings.len(),
            fill_ratio,
            idle_resources: idle,
            min_pool_size,
            max_pool_size,
            is_shutdown,
            warnings,
        }
    }

    /// Check if the pool is healthy
    pub fn is_healthy(&self) -> bool {
        self.is_healthy
    }
}
