//! # ttlcache Core
//!
//! Shared building blocks for the ttlcache workspace:
//!
//! - **Errors**: `CacheError` for configuration and construction failures
//! - **Config**: `CacheConfig`, loadable from the environment
//! - **Constants**: defaults and environment variable names
//! - **Traits**: the `Clock` abstraction with system and manual clocks
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use ttlcache_core::CacheConfig;
//!
//! let config = CacheConfig::default()
//!     .with_lifetime(Duration::from_secs(30))
//!     .with_sweep_interval(Duration::from_secs(5));
//! assert!(config.validate().is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod config;
pub mod constants;
pub mod error;
pub mod traits;

// Re-export commonly used items at crate root
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use traits::{Clock, ManualClock, SystemClock};
