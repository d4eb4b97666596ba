//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.
//!
//! Timestamps come from `tokio::time::Instant`, a monotonic clock that tests
//! can pause and advance.

use tokio::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the value was written
    pub stored_at: Instant,
    /// Expiration instant, None = no expiration
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl_seconds` - Optional TTL in seconds; `None` or `Some(0)` never expires
    pub fn new(value: V, ttl_seconds: Option<u64>) -> Self {
        let now = Instant::now();

        Self {
            value,
            stored_at: now,
            expires_at: expiry_from_ttl(now, ttl_seconds),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current time is
    /// greater than or equal to the expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a caller-supplied instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Age ==
    /// Time elapsed since the value was stored.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.stored_at)
    }

    // == Time To Live ==
    /// Returns remaining TTL, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}

// == Utility Functions ==
/// Computes the expiry instant for a TTL given in seconds.
///
/// A missing or zero TTL means the entry lives until explicitly invalidated.
/// So does a TTL too large to represent as an instant.
pub fn expiry_from_ttl(now: Instant, ttl_seconds: Option<u64>) -> Option<Instant> {
    ttl_seconds
        .filter(|ttl| *ttl > 0)
        .and_then(|ttl| now.checked_add(Duration::from_secs(ttl)))
}
