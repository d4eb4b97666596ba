//! Cache Module
//!
//! Process-local key-value cache with TTL expiration and coalesced population.

mod entry;
mod lock;
mod stats;
mod store;


// Re-export public types
pub use entry::{expiry_from_ttl, CacheEntry};
pub use stats::CacheStats;
pub use store::CacheStore;
