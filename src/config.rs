//! Pool configuration options

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::errors::ConfigError;
use crate::resource::Params;

/// Configuration for resource pool behavior
///
/// Field names map to `PascalCase` keys when loaded from TOML, so a document
/// looks like:
///
/// ```toml
/// InitialPoolSize = 10
/// MaxPoolSize = 30
/// TestDuration = 60000
///
/// [Params]
/// host = "127.0.0.1"
/// ```
///
/// # Examples
///
/// ```
/// use esox_resourcepool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_initial_pool_size(10)
///     .with_max_pool_size(30)
///     .with_test_duration(Duration::from_secs(5))
///     .with_param("host", "127.0.0.1");
///
/// assert_eq!(config.max_pool_size, 30);
/// assert_eq!(config.test_duration_ms, 5000);
/// assert_eq!(config.params["host"], "127.0.0.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PoolConfiguration {
    /// Number of resources created by `initial`
    pub initial_pool_size: usize,

    /// Idle count below which an acquire triggers background growth
    pub min_pool_size: usize,

    /// Upper bound on idle resources
    pub max_pool_size: usize,

    /// Growth attempts an acquire makes on an empty pool before giving up
    pub acquire_retry_attempts: usize,

    /// Number of resources each background growth tries to add
    pub acquire_increment: usize,

    /// Interval between health sweeps, in milliseconds
    #[serde(rename = "TestDuration")]
    pub test_duration_ms: u64,

    /// Health-check every resource before handing it out
    pub test_on_get_item: bool,

    /// Wall-clock cap on how long a single acquire may wait, in milliseconds
    #[serde(rename = "AcquireTimeout")]
    pub acquire_timeout_ms: Option<u64>,

    /// Dispose resources that fail a health check instead of just dropping them
    pub dispose_on_check_failure: bool,

    /// Passed to every lifecycle call
    pub params: Params,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            initial_pool_size: 5,
            min_pool_size: 2,
            max_pool_size: 15,
            acquire_retry_attempts: 5,
            acquire_increment: 5,
            test_duration_ms: 60_000,
            test_on_get_item: false,
            acquire_timeout_ms: None,
            dispose_on_check_failure: false,
            params: Params::new(),
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a `*.toml` file
    ///
    /// Keys missing from the document keep their default values. The loaded
    /// configuration is validated before it is returned.
    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading pool configuration");

        let metadata = std::fs::metadata(path).map_err(|source| {
            error!(path = %path.display(), error = %source, "configuration file not found");
            ConfigError::NotFound {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        if !metadata.is_file() || !is_toml {
            error!(path = %path.display(), "configuration file must be *.toml");
            return Err(ConfigError::WrongExtension {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the sizing and timing parameters for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pool_size == 0 {
            return Err(ConfigError::Invalid(
                "MaxPoolSize must be greater than 0".to_string(),
            ));
        }
        if self.min_pool_size > self.max_pool_size {
            return Err(ConfigError::Invalid(format!(
                "MinPoolSize ({}) must not exceed MaxPoolSize ({})",
                self.min_pool_size, self.max_pool_size
            )));
        }
        if self.test_duration_ms == 0 {
            return Err(ConfigError::Invalid(
                "TestDuration must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Interval between health sweeps
    pub fn test_duration(&self) -> Duration {
        Duration::from_millis(self.test_duration_ms)
    }

    /// Acquire wait cap, if any
    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }

    /// Set the initial pool size
    pub fn with_initial_pool_size(mut self, size: usize) -> Self {
        self.initial_pool_size = size;
        self
    }

    /// Set the minimum idle count
    pub fn with_min_pool_size(mut self, size: usize) -> Self {
        self.min_pool_size = size;
        self
    }

    /// Set the maximum pool size
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_resourcepool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::new()
    ///     .with_max_pool_size(50);
    ///
    /// assert_eq!(config.max_pool_size, 50);
    /// ```
    pub fn with_max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size;
        self
    }

    /// Set how many growth attempts an acquire may make
    pub fn with_acquire_retry_attempts(mut self, attempts: usize) -> Self {
        self.acquire_retry_attempts = attempts;
        self
    }

    /// Set the background growth increment
    pub fn with_acquire_increment(mut self, increment: usize) -> Self {
        self.acquire_increment = increment;
        self
    }

    /// Set the health sweep interval
    pub fn with_test_duration(mut self, interval: Duration) -> Self {
        self.test_duration_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Health-check resources when they are acquired
    pub fn with_test_on_get_item(mut self, enabled: bool) -> Self {
        self.test_on_get_item = enabled;
        self
    }

    /// Cap how long an acquire may wait for growth
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Dispose resources that fail a health check
    pub fn with_dispose_on_check_failure(mut self, enabled: bool) -> Self {
        self.dispose_on_check_failure = enabled;
        self
    }

    /// Add a lifecycle parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for PoolConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "InitialPoolSize: {}", self.initial_pool_size)?;
        writeln!(f, "MinPoolSize: {}", self.min_pool_size)?;
        writeln!(f, "MaxPoolSize: {}", self.max_pool_size)?;
        writeln!(f, "AcquireRetryAttempts: {}", self.acquire_retry_attempts)?;
        writeln!(f, "AcquireIncrement: {}", self.acquire_increment)?;
        writeln!(f, "TestDuration: {}", self.test_duration_ms)?;
        writeln!(f, "TestOnGetItem: {}", self.test_on_get_item)?;
        match self.acquire_timeout_ms {
            Some(ms) => writeln!(f, "AcquireTimeout: {ms}")?,
            None => writeln!(f, "AcquireTimeout: none")?,
        }
        writeln!(f, "DisposeOnCheckFailure: {}", self.dispose_on_check_failure)?;
        writeln!(f, "Params:")?;
        let sorted: BTreeMap<_, _> = self.params.iter().collect();
        for (key, value) in sorted {
            writeln!(f, "\t{key}: {value}")?;
        }
        Ok(())
    }
}
