//! API route handlers
//!
//! - `health`: liveness/readiness probes, stats, and metrics
//! - `search`: fingerprint queries against the four loaded indexes

pub mod health;
pub mod search;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info (GET /, no authentication).
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Chemscreen Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/substructure/molecule",
            "/substructure/reaction",
            "/similarity/molecule",
            "/similarity/reaction",
            "/health",
            "/ready",
            "/stats",
            "/metrics"
        ]
    })))
}

/// 404 handler for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
