//! Cache Store Module
//!
//! Main cache engine: a string-keyed map with TTL expiration plus a registry
//! of in-flight producers that coalesces concurrent population of a key.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, RwLock};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::lock::{rw_read, rw_write};
use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheEntry, CacheStats};
use crate::error::{CacheError, Result};

const SOURCE: &str = "cache::store";

/// Outcome of one producer run, awaitable by any number of callers.
type SharedOutcome<V> = Shared<BoxFuture<'static, Result<V>>>;

struct InFlight<V> {
    outcome: SharedOutcome<V>,
    /// Cleared when the key is written or invalidated during the run
    store_result: bool,
}

struct StoreState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    in_flight: HashMap<String, InFlight<V>>,
}

impl<V> StoreState<V> {
    /// Keeps the run registered, so callers still join it, but stops its
    /// result from being written back.
    fn detach_flights(&mut self, matches: impl Fn(&str) -> bool) -> usize {
        let mut detached = 0;
        for (key, flight) in self.in_flight.iter_mut() {
            if flight.store_result && matches(key.as_str()) {
                flight.store_result = false;
                detached += 1;
            }
        }
        detached
    }
}

struct StoreInner<V> {
    state: RwLock<StoreState<V>>,
    stats: StatsRecorder,
}

// == Cache Store ==
/// Shared handle to a process-local cache.
///
/// Cloning is cheap; every clone refers to the same entries. Construct one
/// store per execution context and pass it to whoever needs it.
pub struct CacheStore<V> {
    inner: Arc<StoreInner<V>>,
}

impl<V> Clone for CacheStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for CacheStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = rw_read(&self.inner.state, SOURCE, "debug");
        f.debug_struct("CacheStore")
            .field("entries", &state.entries.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

impl<V> Default for CacheStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(StoreState {
                    entries: HashMap::new(),
                    in_flight: HashMap::new(),
                }),
                stats: StatsRecorder::default(),
            }),
        }
    }

    // == Has ==
    /// Returns true iff a live entry exists for `key`.
    ///
    /// An expired entry found here is purged, same as in [`get`](Self::get).
    pub fn has(&self, key: &str) -> bool {
        self.read_live(key, "has", |_| ()).is_some()
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `None` when the key is absent or expired. Expired entries are
    /// removed on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        let value = self.read_live(key, "get", |entry| entry.value.clone());
        match value {
            Some(_) => self.inner.stats.record_hit(),
            None => self.inner.stats.record_miss(),
        }
        value
    }

    // == Peek ==
    /// Returns a copy of the live entry, including its timestamps.
    ///
    /// Does not count towards hit/miss statistics.
    pub fn peek(&self, key: &str) -> Option<CacheEntry<V>> {
        self.read_live(key, "peek", |entry| entry.clone())
    }

    // == Set ==
    /// Stores a value, overwriting any existing entry and resetting its TTL.
    ///
    /// A producer in flight for the key is detached: it stays joinable and its
    /// waiters still get its result, but the result is not written back over
    /// this value.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl_seconds` - TTL in seconds; `None` or `Some(0)` never expires
    pub fn set(&self, key: impl Into<String>, value: V, ttl_seconds: Option<u64>) {
        let key = key.into();
        let entry = CacheEntry::new(value, ttl_seconds);

        let mut state = rw_write(&self.inner.state, SOURCE, "set");
        if state.detach_flights(|k| k == key) > 0 {
            debug!(key = %key, "set detached in-flight producer");
        }
        state.entries.insert(key, entry);
    }

    // == Delete ==
    /// Removes an entry by key. Idempotent.
    ///
    /// Returns whether a live or expired entry was removed. A producer in
    /// flight for the key keeps serving its waiters and any later caller, but
    /// its result is discarded.
    pub fn delete(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut state = rw_write(&self.inner.state, SOURCE, "delete");
        state.detach_flights(|k| k == key);
        match state.entries.remove(key) {
            Some(entry) => {
                self.record_removed(entry.is_expired_at(now));
                true
            }
            None => false,
        }
    }

    // == Delete Prefix ==
    /// Removes every entry whose key starts with `prefix`.
    ///
    /// Producers in flight for matching keys are detached. Returns the number
    /// of entries removed, expired ones included.
    pub fn delete_prefix(&self, prefix: &str) -> usize {
        let now = Instant::now();
        let mut state = rw_write(&self.inner.state, SOURCE, "delete_prefix");
        let mut removed = 0;
        state.entries.retain(|key, entry| {
            if !key.starts_with(prefix) {
                return true;
            }
            self.record_removed(entry.is_expired_at(now));
            removed += 1;
            false
        });
        state.detach_flights(|key| key.starts_with(prefix));
        removed
    }

    // == Clear ==
    /// Removes all entries and detaches all in-flight producers.
    ///
    /// Returns the number of entries removed, expired ones included.
    pub fn clear(&self) -> usize {
        let now = Instant::now();
        let mut state = rw_write(&self.inner.state, SOURCE, "clear");
        let removed = state.entries.len();
        for (_, entry) in state.entries.drain() {
            self.record_removed(entry.is_expired_at(now));
        }
        state.detach_flights(|_| true);
        removed
    }

    // == Keys ==
    /// Lists live keys, optionally restricted to those starting with `prefix`.
    ///
    /// Membership reflects the moment of enumeration; concurrent writers may
    /// change the store before the caller acts on the result.
    pub fn keys(&self, prefix: Option<&str>) -> Vec<String> {
        let now = Instant::now();
        let state = rw_read(&self.inner.state, SOURCE, "keys");
        let mut keys: Vec<String> = state
            .entries
            .iter()
            .filter(|(key, entry)| {
                !entry.is_expired_at(now) && prefix.map_or(true, |p| key.starts_with(p))
            })
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    // == Get Or Set ==
    /// Returns the live value for `key`, populating it with `producer` on a miss.
    ///
    /// Concurrent callers on the same cold key share a single producer run and
    /// all observe its outcome. A failed run stores nothing and is reported to
    /// every waiter as [`CacheError::Producer`]; the next call retries.
    ///
    /// The producer is invoked on a spawned task, never under the store lock,
    /// so it may read or write this store. A caller dropping this future does
    /// not cancel the run for other waiters. Must be called from within a
    /// tokio runtime.
    pub async fn get_or_set<F, Fut>(
        &self,
        key: impl Into<String>,
        producer: F,
        ttl_seconds: Option<u64>,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        self.populate(key.into(), producer, ttl_seconds, false).await
    }

    // == Refresh ==
    /// Runs `producer` for `key` even if a live entry exists.
    ///
    /// Joins an in-flight run instead of starting a second one. The current
    /// entry stays readable until the new value lands.
    pub async fn refresh<F, Fut>(
        &self,
        key: impl Into<String>,
        producer: F,
        ttl_seconds: Option<u64>,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        self.populate(key.into(), producer, ttl_seconds, true).await
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = rw_write(&self.inner.state, SOURCE, "cleanup_expired");
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - state.entries.len();

        self.inner.stats.record_expired(removed);
        removed
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        rw_read(&self.inner.state, SOURCE, "len").entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of producers currently registered as in flight.
    pub fn in_flight_count(&self) -> usize {
        rw_read(&self.inner.state, SOURCE, "in_flight_count")
            .in_flight
            .len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let (entries, in_flight) = {
            let state = rw_read(&self.inner.state, SOURCE, "stats");
            (state.entries.len(), state.in_flight.len())
        };
        self.inner.stats.snapshot(entries, in_flight)
    }

    // == Internals ==

    fn record_removed(&self, expired: bool) {
        if expired {
            self.inner.stats.record_expired(1);
        } else {
            self.inner.stats.record_invalidated(1);
        }
    }

    /// Applies `f` to the live entry for `key`, purging it if expired.
    fn read_live<R>(
        &self,
        key: &str,
        op: &'static str,
        f: impl FnOnce(&CacheEntry<V>) -> R,
    ) -> Option<R> {
        let now = Instant::now();
        {
            let state = rw_read(&self.inner.state, SOURCE, op);
            match state.entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired_at(now) => return Some(f(entry)),
                Some(_) => {}
            }
        }

        // Re-check under the write lock; a writer may have replaced the entry.
        let mut state = rw_write(&self.inner.state, SOURCE, op);
        let expired = state
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired_at(now));
        if expired {
            state.entries.remove(key);
            self.inner.stats.record_expired(1);
            debug!(key, "purged expired entry");
        }
        None
    }

    async fn populate<F, Fut>(
        &self,
        key: String,
        producer: F,
        ttl_seconds: Option<u64>,
        force: bool,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let outcome = {
            let now = Instant::now();
            let mut state = rw_write(&self.inner.state, SOURCE, "populate");

            if !force {
                let live = state
                    .entries
                    .get(&key)
                    .filter(|entry| !entry.is_expired_at(now))
                    .map(|entry| entry.value.clone());
                if let Some(value) = live {
                    self.inner.stats.record_hit();
                    return Ok(value);
                }
                if state.entries.remove(&key).is_some() {
                    self.inner.stats.record_expired(1);
                }
                self.inner.stats.record_miss();
            }

            if let Some(flight) = state.in_flight.get(&key) {
                self.inner.stats.record_coalesced();
                debug!(key = %key, "joining in-flight producer");
                flight.outcome.clone()
            } else {
                let outcome = self.launch(key.clone(), producer, ttl_seconds);
                state.in_flight.insert(
                    key,
                    InFlight {
                        outcome: outcome.clone(),
                        store_result: true,
                    },
                );
                outcome
            }
        };

        outcome.await
    }

    /// Spawns the producer and returns its shareable outcome.
    ///
    /// Called with the state lock held; the spawned task cannot settle before
    /// the caller registers it. The producer itself is only invoked inside
    /// the task.
    fn launch<F, Fut>(
        &self,
        key: String,
        producer: F,
        ttl_seconds: Option<u64>,
    ) -> SharedOutcome<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        self.inner.stats.record_producer_call();
        debug!(key = %key, "starting producer");

        let guard = FlightGuard {
            inner: Arc::clone(&self.inner),
            key: key.clone(),
            settled: false,
        };

        let handle = tokio::spawn(async move {
            let outcome = producer().await.map_err(CacheError::producer);
            guard.settle(&outcome, ttl_seconds);
            outcome
        });

        async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(key = %key, error = %err, "producer task did not complete");
                    Err(CacheError::ProducerAborted(key))
                }
            }
        }
        .boxed()
        .shared()
    }
}

// == Flight Guard ==
/// Owns the in-flight registration of one producer run.
///
/// A key is registered by at most one run, and only that run's guard removes
/// the registration. Settling writes the result back (on success, unless the
/// run was detached) and unregisters the run. Dropping without settling, e.g.
/// when the producer panics, only unregisters.
struct FlightGuard<V> {
    inner: Arc<StoreInner<V>>,
    key: String,
    settled: bool,
}

impl<V> FlightGuard<V> {
    /// Removes the registration, returning whether the result should be stored.
    fn unregister(&self, state: &mut StoreState<V>) -> bool {
        state
            .in_flight
            .remove(&self.key)
            .is_some_and(|flight| flight.store_result)
    }

    fn settle(mut self, outcome: &Result<V>, ttl_seconds: Option<u64>)
    where
        V: Clone,
    {
        self.settled = true;
        let mut state = rw_write(&self.inner.state, SOURCE, "settle");
        let store_result = self.unregister(&mut state);

        match outcome {
            Ok(value) if store_result => {
                state
                    .entries
                    .insert(self.key.clone(), CacheEntry::new(value.clone(), ttl_seconds));
                debug!(key = %self.key, "producer result stored");
            }
            Ok(_) => {
                debug!(key = %self.key, "producer detached, result not stored");
            }
            Err(err) => {
                self.inner.stats.record_producer_failure();
                warn!(key = %self.key, error = %err, "producer failed");
            }
        }
    }
}

impl<V> Drop for FlightGuard<V> {
    fn drop(&mut self) {
        if !self.settled {
            let mut state = rw_write(&self.inner.state, SOURCE, "abandon");
            self.unregister(&mut state);
        }
    }
}
