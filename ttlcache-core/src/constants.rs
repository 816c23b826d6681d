//! Default settings and environment variable names.

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default entry lifetime in milliseconds (5 minutes).
pub const DEFAULT_LIFETIME_MS: u64 = 300_000;

/// Default interval between background sweeps in milliseconds (1 minute).
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60_000;

// ═══════════════════════════════════════════════════════════════════════════════
// ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Overrides `CacheConfig::lifetime_ms`.
pub const ENV_LIFETIME_MS: &str = "TTLCACHE_LIFETIME_MS";

/// Overrides `CacheConfig::sweep_interval_ms`.
pub const ENV_SWEEP_INTERVAL_MS: &str = "TTLCACHE_SWEEP_INTERVAL_MS";
