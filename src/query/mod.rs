//! Query Module
//!
//! Adapter between presentation code and the cache: a freshness window on top
//! of the store's hard expiry, plus an observable `Idle/Loading/Success/Error`
//! state that keeps serving the last good value.

mod binding;
mod state;

pub use binding::{Producer, Query, QueryOptions};
pub use state::{QueryState, QueryStatus};
