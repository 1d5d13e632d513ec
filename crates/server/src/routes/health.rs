use crate::error::{ServerError, ServerResult};
use crate::state::SearchService;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde_json::json;
use std::sync::{Arc, OnceLock};

static PROMETHEUS: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the process-wide Prometheus recorder. Idempotent: a second call
/// (e.g. from tests building several routers) keeps the first handle.
pub fn init_metrics() {
    if PROMETHEUS.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = PROMETHEUS.set(handle);
        }
        Err(e) => tracing::warn!("metrics recorder not installed: {e}"),
    }
}

/// Liveness probe (GET /health).
pub async fn health_check() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({ "status": "ok" })))
}

/// Readiness probe (GET /ready). The index bundle loads before the listener
/// binds, so a serving process is always ready.
pub async fn readiness_check(
    State(state): State<Arc<SearchService>>,
) -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "status": "ready",
        "uptime_seconds": state.uptime_seconds(),
    })))
}

/// Per-index counters (GET /stats).
pub async fn stats(State(state): State<Arc<SearchService>>) -> ServerResult<impl IntoResponse> {
    Ok(Json(state.stats()))
}

/// Prometheus metrics (GET /metrics).
pub async fn metrics(State(state): State<Arc<SearchService>>) -> ServerResult<impl IntoResponse> {
    if !state.config.metrics_enabled {
        return Err(ServerError::NotFound);
    }
    let body = PROMETHEUS.get().map(PrometheusHandle::render).unwrap_or_default();
    Ok(body)
}
