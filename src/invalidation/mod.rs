//! Invalidation Module
//!
//! Convention-based group invalidation over a [`CacheStore`](crate::cache::CacheStore).
//!
//! Keys are namespaced by a colon-delimited domain prefix: `product:<id>` for a
//! single entity, `products:<anything>` for collection views that may contain it.

mod domain;
mod router;

pub use domain::Domain;
pub use router::CacheInvalidator;
