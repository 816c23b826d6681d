//! Expiring key-value cache.
//!
//! Entries live for a fixed lifetime set per cache. Reads never return an
//! expired entry, and a cancellable background task reclaims the ones nobody
//! reads again.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cache;
mod entry;
mod sweep;

pub use cache::{CacheStats, ExpiringCache};

pub use ttlcache_core::{CacheConfig, CacheError, Clock, ManualClock, SystemClock};
