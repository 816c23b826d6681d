//! In-memory cache whose entries expire a fixed time after they are written.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use ttlcache_core::{CacheConfig, CacheError, Clock, Result, SystemClock};

use crate::entry::Entry;
use crate::sweep::{self, Sweep};

/// Storage shared by every handle and, weakly, by the sweep task.
struct Shared<K, V, C> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    lifetime: Duration,
    clock: C,
}

impl<K, V, C> Shared<K, V, C>
where
    K: Eq + Hash,
    C: Clock,
{
    /// Removes everything expired as of one reading of the clock.
    ///
    /// Entries that expire while the scan runs are left for the next pass.
    fn cleanup(&self) -> usize {
        let mut entries = self.entries.lock();
        let now = self.clock.now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }
}

impl<K, V, C> Sweep for Shared<K, V, C>
where
    K: Eq + Hash + Send + 'static,
    V: Send + 'static,
    C: Clock,
{
    fn sweep(&self) -> usize {
        self.cleanup()
    }
}

/// Concurrency-safe key-value cache with a fixed entry lifetime.
///
/// Every `set` stamps its entry to expire `lifetime` later. Expired entries
/// are never returned: `get` and `has` treat them as absent and delete them on
/// the spot. A background task removes the rest every `sweep_interval` until
/// the cancellation token passed at construction fires.
///
/// A single mutex guards the whole map, so all operations are linearizable.
/// Handles are cheap to clone and share the same storage.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use ttlcache_cache::ExpiringCache;
///
/// #[tokio::main]
/// async fn main() {
///     let cancel = CancellationToken::new();
///     let cache = ExpiringCache::new(
///         Duration::from_secs(30),
///         Duration::from_secs(5),
///         cancel.clone(),
///     );
///
///     cache.set("alice", 1);
///     assert_eq!(cache.get("alice"), Some(1));
///
///     // Stops the sweeper; the cache keeps working as a passive map.
///     cancel.cancel();
/// }
/// ```
pub struct ExpiringCache<K, V, C = SystemClock> {
    shared: Arc<Shared<K, V, C>>,
    sweeping: Arc<AtomicBool>,
}

impl<K, V> ExpiringCache<K, V, SystemClock>
where
    K: Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    /// Creates an empty cache and starts its sweep task.
    ///
    /// The task runs every `sweep_interval` until `cancel` fires. A zero
    /// `lifetime` makes every entry expire immediately.
    ///
    /// No task is started, and the cache only expires entries lazily, when
    /// `sweep_interval` is zero (it would spin) or when there is no Tokio
    /// runtime to spawn on. Both cases are logged. Use
    /// [`from_config`](Self::from_config) to get an error instead.
    pub fn new(lifetime: Duration, sweep_interval: Duration, cancel: CancellationToken) -> Self {
        Self::with_clock(lifetime, sweep_interval, cancel, SystemClock)
    }

    /// Creates a cache from a validated configuration.
    ///
    /// # Errors
    ///
    /// - `CacheError::InvalidConfig` if the sweep interval is zero
    /// - `CacheError::NoRuntime` if called outside a Tokio runtime
    pub fn from_config(config: &CacheConfig, cancel: CancellationToken) -> Result<Self> {
        config.validate()?;
        let handle = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
        Ok(Self::build(
            config.lifetime(),
            config.sweep_interval(),
            cancel,
            SystemClock,
            Some(&handle),
        ))
    }
}

impl<K, V, C> ExpiringCache<K, V, C>
where
    K: Eq + Hash + Send + 'static,
    V: Send + 'static,
    C: Clock,
{
    /// Same as [`new`](ExpiringCache::new), reading time from `clock`.
    pub fn with_clock(
        lifetime: Duration,
        sweep_interval: Duration,
        cancel: CancellationToken,
        clock: C,
    ) -> Self {
        let handle = Handle::try_current().ok();
        Self::build(lifetime, sweep_interval, cancel, clock, handle.as_ref())
    }

    fn build(
        lifetime: Duration,
        sweep_interval: Duration,
        cancel: CancellationToken,
        clock: C,
        handle: Option<&Handle>,
    ) -> Self {
        let shared = Arc::new(Shared {
            entries: Mutex::new(HashMap::new()),
            lifetime,
            clock,
        });
        let sweeping = Arc::new(AtomicBool::new(false));

        match handle {
            None => warn!("No Tokio runtime, expired entries will only be removed on access"),
            Some(_) if sweep_interval.is_zero() => {
                warn!("Sweep interval is zero, background sweeping disabled")
            }
            Some(handle) => {
                sweep::spawn(
                    handle,
                    Arc::downgrade(&shared),
                    sweep_interval,
                    cancel,
                    sweeping.clone(),
                );
            }
        }

        Self { shared, sweeping }
    }
}

impl<K, V, C> ExpiringCache<K, V, C>
where
    K: Eq + Hash,
    C: Clock,
{
    /// Inserts or overwrites `key`, expiring `lifetime` from now.
    pub fn set(&self, key: K, value: V) {
        let mut entries = self.shared.entries.lock();
        let now = self.shared.clock.now();
        entries.insert(key, Entry::new(value, now, self.shared.lifetime));
    }

    /// Returns a clone of the value for `key` if it is present and unexpired.
    ///
    /// An expired entry found here is deleted immediately.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let mut entries = self.shared.entries.lock();
        let now = self.shared.clock.now();
        Self::live(&mut entries, key, now).map(|entry| entry.value().clone())
    }

    /// Returns true if `key` is present and unexpired.
    ///
    /// An expired entry found here is deleted immediately.
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut entries = self.shared.entries.lock();
        let now = self.shared.clock.now();
        Self::live(&mut entries, key, now).is_some()
    }

    /// Removes `key`. Removing an absent key is a no-op.
    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared.entries.lock().remove(key);
    }

    /// Removes every entry expired at the start of the call.
    ///
    /// This is what the sweep task runs. Returns the number removed.
    pub fn cleanup(&self) -> usize {
        let removed = self.shared.cleanup();
        trace!(removed, "Manual cleanup");
        removed
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.shared.entries.lock().clear();
    }

    /// Number of stored entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.shared.entries.lock().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.shared.entries.lock().is_empty()
    }

    /// Lifetime applied to every entry.
    pub fn lifetime(&self) -> Duration {
        self.shared.lifetime
    }

    /// Returns true while the background sweep task is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeping.load(Ordering::SeqCst)
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let entries = self.shared.entries.lock();
        let now = self.shared.clock.now();
        let expired = entries.values().filter(|e| e.is_expired_at(now)).count();

        CacheStats {
            total_entries: entries.len(),
            expired_entries: expired,
            live_entries: entries.len() - expired,
            lifetime: self.shared.lifetime,
        }
    }

    fn live<'a, Q>(
        entries: &'a mut HashMap<K, Entry<V>>,
        key: &Q,
        now: Instant,
    ) -> Option<&'a Entry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if entries.get(key)?.is_expired_at(now) {
            entries.remove(key);
            trace!("Evicted expired entry on access");
            return None;
        }
        entries.get(key)
    }
}

impl<K, V, C> Clone for ExpiringCache<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            sweeping: Arc::clone(&self.sweeping),
        }
    }
}

impl<K, V, C> fmt::Debug for ExpiringCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("entries", &self.shared.entries.lock().len())
            .field("lifetime", &self.shared.lifetime)
            .field("sweeping", &self.sweeping.load(Ordering::SeqCst))
            .finish()
    }
}

/// Cache statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStats {
    /// Stored entries (including expired)
    pub total_entries: usize,
    /// Expired entries not yet removed
    pub expired_entries: usize,
    /// Unexpired entries
    pub live_entries: usize,
    /// Lifetime applied to every entry
    pub lifetime: Duration,
}
