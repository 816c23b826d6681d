//! Error types for ttlcache.
//!
//! Cache reads and writes are total and never fail. Errors only exist where a
//! cache is configured and constructed.

use thiserror::Error;

/// Result type alias using `CacheError`.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors raised while configuring or constructing a cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Configuration rejected by validation.
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),

    /// No Tokio runtime is available to host the sweep task.
    #[error("No Tokio runtime available to spawn the sweep task")]
    NoRuntime,
}

impl CacheError {
    /// Returns true if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(self, CacheError::InvalidConfig(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::InvalidConfig("sweep_interval_ms must be greater than zero".into());
        assert!(err.to_string().contains("sweep_interval_ms"));
        assert!(err.to_string().starts_with("Invalid cache configuration"));

        assert!(CacheError::NoRuntime.to_string().contains("Tokio runtime"));
    }

    #[test]
    fn test_error_classification() {
        assert!(CacheError::InvalidConfig("test".into()).is_config_error());
        assert!(!CacheError::NoRuntime.is_config_error());
    }
}
