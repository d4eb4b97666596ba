//! Observable query state.

use serde::Serialize;
use tokio::time::Instant;

use crate::error::CacheError;

// == Query Status ==
/// Lifecycle of one logical query.
///
/// `Idle -> Loading -> Success | Error`; `Success` and `Error` go back to
/// `Loading` on refetch or background revalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

// == Query State ==
/// What presentation code renders for a query.
///
/// `data` survives errors and reloads, so the last good value can be shown
/// next to a loading indicator or the latest error.
#[derive(Debug, Clone)]
pub struct QueryState<V> {
    pub status: QueryStatus,
    /// Last value delivered by the cache or a producer
    pub data: Option<V>,
    /// Error from the most recent failed fetch, cleared on success
    pub error: Option<CacheError>,
    /// When `data` was last replaced
    pub updated_at: Option<Instant>,
}

impl<V> QueryState<V> {
    pub fn idle(data: Option<V>) -> Self {
        let updated_at = data.as_ref().map(|_| Instant::now());
        Self {
            status: QueryStatus::Idle,
            data,
            error: None,
            updated_at,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub(crate) fn begin_loading(&mut self) {
        self.status = QueryStatus::Loading;
    }

    pub(crate) fn succeed(&mut self, value: V) {
        self.status = QueryStatus::Success;
        self.data = Some(value);
        self.error = None;
        self.updated_at = Some(Instant::now());
    }

    pub(crate) fn fail(&mut self, error: CacheError) {
        self.status = QueryStatus::Error;
        self.error = Some(error);
    }
}
