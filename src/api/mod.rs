//! API Module
//!
//! HTTP admin surface over the server-side cache instance.
//!
//! # Endpoints
//! - `PUT /cache`, `DELETE /cache` - Set a key / clear everything
//! - `GET /cache/:key`, `DELETE /cache/:key` - Read / delete one key
//! - `GET /keys` - List live keys
//! - `POST /invalidate/:domain[/:id]` - Domain invalidation
//! - `GET /stats`, `GET /health`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
