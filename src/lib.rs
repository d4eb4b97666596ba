//! pos_cache - Application-level cache for a point-of-sale backend
//!
//! Process-local key-value store with TTL expiry, coalesced population of
//! cold keys, domain-prefix invalidation and a stale-while-revalidate query
//! binding. An HTTP admin surface exposes the server-side instance.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod invalidation;
pub mod models;
pub mod query;
pub mod tasks;

pub use api::AppState;
pub use cache::CacheStore;
pub use config::Config;
pub use error::CacheError;
pub use invalidation::{CacheInvalidator, Domain};
pub use query::{Query, QueryOptions, QueryState, QueryStatus};
pub use tasks::spawn_cleanup_task;
