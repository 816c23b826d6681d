use std::time::{Duration, Instant};

/// A stored value with its expiration time.
#[derive(Debug, Clone)]
pub(crate) struct Entry<V> {
    value: V,
    /// `None` when `inserted_at + lifetime` is past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    /// Stamps `value` to expire `lifetime` after `now`.
    pub(crate) fn new(value: V, now: Instant, lifetime: Duration) -> Self {
        Self {
            value,
            expires_at: now.checked_add(lifetime),
        }
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    /// An entry is expired once `now` reaches its deadline.
    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) => deadline <= now,
            None => false,
        }
    }
}
