//! Query binding: stale-while-revalidate reads over a cache store.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::Result;
use crate::query::{QueryState, QueryStatus};

/// Reusable producer for one query; invoked once per population.
pub type Producer<V> = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<V>> + Send + Sync>;

// == Query Options ==
/// Time windows of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Age after which a cached value is served once more and refreshed in the background
    pub stale_time: Duration,
    /// Hard expiry handed to the store; `None` keeps values until invalidated
    pub ttl_seconds: Option<u64>,
}

impl QueryOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            stale_time: Duration::from_secs(config.query_stale_time),
            ttl_seconds: Some(config.query_ttl),
        }
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

struct QueryInner<V> {
    store: CacheStore<V>,
    key: String,
    producer: Producer<V>,
    options: QueryOptions,
    state: watch::Sender<QueryState<V>>,
}

// == Query ==
/// One cache key bound to the producer that fills it.
///
/// Clones share state and subscribers.
pub struct Query<V> {
    inner: Arc<QueryInner<V>>,
}

impl<V> Clone for Query<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for Query<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("key", &self.inner.key)
            .field("options", &self.inner.options)
            .finish()
    }
}

impl<V> Query<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Binds `key` in `store` to `producer`.
    ///
    /// The initial state is `Idle`, carrying whatever the store already holds.
    pub fn new<F, Fut>(
        store: CacheStore<V>,
        key: impl Into<String>,
        producer: F,
        options: QueryOptions,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let key = key.into();
        let producer: Producer<V> = Arc::new(move || producer().boxed());
        let cached = store.peek(&key).map(|entry| entry.value);
        let (state, _) = watch::channel(QueryState::idle(cached));

        Self {
            inner: Arc::new(QueryInner {
                store,
                key,
                producer,
                options,
                state,
            }),
        }
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    // == Synchronous reads ==
    /// Current cached value, without triggering any fetch.
    pub fn read(&self) -> Option<V> {
        self.inner.store.get(&self.inner.key)
    }

    /// Current cached value or `default`.
    pub fn read_or(&self, default: V) -> V {
        self.read().unwrap_or(default)
    }

    /// True when nothing is cached or the cached value is older than `stale_time`.
    pub fn is_stale(&self) -> bool {
        self.inner
            .store
            .peek(&self.inner.key)
            .map_or(true, |entry| entry.age() >= self.inner.options.stale_time)
    }

    // == Fetch ==
    /// Returns the value, loading it if necessary.
    ///
    /// - fresh entry: returned as is
    /// - stale entry: returned as is, with a refresh started in the background
    /// - no entry: loaded through the store, coalescing with other callers
    pub async fn fetch(&self) -> Result<V> {
        match self.inner.store.peek(&self.inner.key) {
            Some(entry) if entry.age() < self.inner.options.stale_time => {
                let value = entry.value;
                self.inner.state.send_modify(|state| state.succeed(value.clone()));
                Ok(value)
            }
            Some(entry) => {
                debug!(key = %self.inner.key, "serving stale value, revalidating");
                let value = entry.value;
                self.inner.state.send_modify(|state| state.succeed(value.clone()));
                self.revalidate_in_background();
                Ok(value)
            }
            None => self.run(false).await,
        }
    }

    /// Forces a producer run, joining one already in flight.
    ///
    /// The last value stays in the state while loading and after a failure.
    pub async fn refetch(&self) -> Result<V> {
        self.run(true).await
    }

    /// Starts a forced refresh on a spawned task.
    ///
    /// The state switches to `Loading` before this returns.
    pub fn revalidate_in_background(&self) -> JoinHandle<Result<V>> {
        self.inner.state.send_modify(QueryState::begin_loading);
        let query = self.clone();
        tokio::spawn(async move { query.run(true).await })
    }

    // == Invalidate ==
    /// Drops the cached value and resets the query to `Idle`.
    ///
    /// Returns whether an entry was removed.
    pub fn invalidate(&self) -> bool {
        let removed = self.inner.store.delete(&self.inner.key);
        self.inner.state.send_replace(QueryState::idle(None));
        removed
    }

    // == Observation ==
    pub fn subscribe(&self) -> watch::Receiver<QueryState<V>> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> QueryState<V> {
        self.inner.state.borrow().clone()
    }

    pub fn status(&self) -> QueryStatus {
        self.inner.state.borrow().status
    }

    async fn run(&self, force: bool) -> Result<V> {
        self.inner.state.send_modify(QueryState::begin_loading);

        let producer = Arc::clone(&self.inner.producer);
        let key = self.inner.key.clone();
        let ttl = self.inner.options.ttl_seconds;
        let outcome = if force {
            self.inner.store.refresh(key, move || producer(), ttl).await
        } else {
            self.inner.store.get_or_set(key, move || producer(), ttl).await
        };

        match &outcome {
            Ok(value) => {
                self.inner.state.send_modify(|state| state.succeed(value.clone()));
            }
            Err(err) => {
                warn!(key = %self.inner.key, error = %err, "query fetch failed");
                self.inner.state.send_modify(|state| state.fail(err.clone()));
            }
        }
        outcome
    }
}
