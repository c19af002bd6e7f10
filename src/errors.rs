//! Error types for the resource pool

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Error reported by a [`Resource`](crate::Resource) lifecycle call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ResourceError {
    message: String,
}

impl ResourceError {
    /// Create a new resource error with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message this error was created with
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Unable to acquire a resource after {attempts} growth attempts")]
    CannotAcquire { attempts: usize },

    #[error("Pool has been shut down")]
    Shutdown,

    #[error("Resource failed its health check: {0}")]
    HealthCheck(#[source] ResourceError),

    #[error("Acquire timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation was cancelled")]
    Cancelled,
}

pub type PoolResult<T> = Result<T, PoolError>;

/// Errors from loading a [`PoolConfiguration`](crate::PoolConfiguration)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration at '{}': {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration file '{}' is not a *.toml file", .path.display())]
    WrongExtension { path: PathBuf },

    #[error("invalid configuration document: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
