//! Cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_LIFETIME_MS, DEFAULT_SWEEP_INTERVAL_MS, ENV_LIFETIME_MS, ENV_SWEEP_INTERVAL_MS,
};
use crate::error::{CacheError, Result};

/// Cache configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime applied to every entry, in milliseconds
    pub lifetime_ms: u64,
    /// Interval between background sweeps, in milliseconds
    pub sweep_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            lifetime_ms: DEFAULT_LIFETIME_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from the environment (and `.env` if present).
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str, default: u64| {
            get(name)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        Self {
            lifetime_ms: read(ENV_LIFETIME_MS, DEFAULT_LIFETIME_MS),
            sweep_interval_ms: read(ENV_SWEEP_INTERVAL_MS, DEFAULT_SWEEP_INTERVAL_MS),
        }
    }

    /// Sets the entry lifetime.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime_ms = duration_to_ms(lifetime);
        self
    }

    /// Sets the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval_ms = duration_to_ms(interval);
        self
    }

    /// Entry lifetime as a `Duration`.
    pub fn lifetime(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms)
    }

    /// Sweep interval as a `Duration`.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Checks the configuration.
    ///
    /// A zero lifetime is allowed (entries expire immediately). A zero sweep
    /// interval is rejected since the sweeper would spin.
    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "sweep_interval_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn duration_to_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.lifetime(), Duration::from_secs(300));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern_chaining() {
        let config = CacheConfig::new()
            .with_lifetime(Duration::from_millis(50))
            .with_sweep_interval(Duration::from_millis(10));
        assert_eq!(config.lifetime_ms, 50);
        assert_eq!(config.sweep_interval_ms, 10);
    }

    #[test_case(0, 1, true ; "zero lifetime is allowed")]
    #[test_case(50, 10, true ; "regular values")]
    #[test_case(50, 0, false ; "zero sweep interval is rejected")]
    #[test_case(0, 0, false ; "both zero")]
    fn test_validate(lifetime_ms: u64, sweep_interval_ms: u64, ok: bool) {
        let config = CacheConfig {
            lifetime_ms,
            sweep_interval_ms,
        };
        assert_eq!(config.validate().is_ok(), ok);
    }

    #[test]
    fn test_from_vars_overrides() {
        let env = vars(&[(ENV_LIFETIME_MS, "1500"), (ENV_SWEEP_INTERVAL_MS, " 250 ")]);
        let config = CacheConfig::from_vars(|k| env.get(k).cloned());
        assert_eq!(config.lifetime_ms, 1500);
        assert_eq!(config.sweep_interval_ms, 250);
    }

    #[test]
    fn test_from_vars_falls_back_on_garbage() {
        let env = vars(&[(ENV_LIFETIME_MS, "soon"), (ENV_SWEEP_INTERVAL_MS, "-5")]);
        let config = CacheConfig::from_vars(|k| env.get(k).cloned());
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_from_vars_unset() {
        let config = CacheConfig::from_vars(|_| None);
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_serde_partial_document_uses_defaults() {
        let config: CacheConfig = serde_json::from_str(r#"{"lifetime_ms": 42}"#).unwrap();
        assert_eq!(config.lifetime_ms, 42);
        assert_eq!(config.sweep_interval_ms, DEFAULT_SWEEP_INTERVAL_MS);
    }
}
