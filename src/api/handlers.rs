//! API Handlers
//!
//! HTTP request handlers for each cache admin endpoint.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::cache::CacheStore;
use crate::error::{CacheError, Result};
use crate::invalidation::{CacheInvalidator, Domain};
use crate::models::{
    validate_key, DeleteResponse, GetResponse, HealthResponse, InvalidateResponse, KeysQuery,
    KeysResponse, SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// Holds the server-side cache instance and the invalidation router bound to it.
#[derive(Clone)]
pub struct AppState {
    /// Server-side cache store
    pub cache: CacheStore<Value>,
    /// Invalidation router targeting `cache`
    pub invalidator: CacheInvalidator<Value>,
}

impl AppState {
    /// Creates a new AppState around the given cache store.
    pub fn new(cache: CacheStore<Value>) -> Self {
        Self {
            invalidator: CacheInvalidator::new(cache.clone()),
            cache,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(CacheStore::new())
    }
}

/// Handler for PUT /cache
///
/// Stores a JSON value in the cache with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.set(req.key.clone(), req.value, req.ttl);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /cache/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let entry = state
        .cache
        .peek(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse {
        ttl_remaining: entry.ttl_remaining().map(|d| d.as_secs()),
        value: entry.value,
        key,
    }))
}

/// Handler for DELETE /cache/:key
///
/// Succeeds whether or not the key existed.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.cache.delete(&key);

    Ok(Json(DeleteResponse { key, removed }))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let removed = state.invalidator.clear_all();

    Json(InvalidateResponse {
        domain: None,
        id: None,
        removed,
    })
}

/// Handler for GET /keys?prefix=
pub async fn keys_handler(
    State(state): State<AppState>,
    Query(query): Query<KeysQuery>,
) -> Json<KeysResponse> {
    Json(KeysResponse::new(state.cache.keys(query.prefix.as_deref())))
}

/// Handler for POST /invalidate/:domain
pub async fn invalidate_domain_handler(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    let domain: Domain = domain.parse()?;
    let removed = state.invalidator.invalidate_all(domain);

    Ok(Json(InvalidateResponse {
        domain: Some(domain),
        id: None,
        removed,
    }))
}

/// Handler for POST /invalidate/:domain/:id
pub async fn invalidate_entity_handler(
    State(state): State<AppState>,
    Path((domain, id)): Path<(String, String)>,
) -> Result<Json<InvalidateResponse>> {
    let domain: Domain = domain.parse()?;
    let removed = state.invalidator.invalidate_by_id(domain, &id);

    Ok(Json(InvalidateResponse {
        domain: Some(domain),
        id: Some(id),
        removed,
    }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
