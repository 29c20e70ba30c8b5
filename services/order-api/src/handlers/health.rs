use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::{AppState, CacheBackend};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub cache: CacheBackend,
}

/// Liveness plus the cache mode. Running without Redis still serves every
/// request, only slower, so it is reported as degraded rather than failing.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match state.cache_backend {
        CacheBackend::Redis => "healthy",
        CacheBackend::Disabled => "degraded",
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        cache: state.cache_backend,
    })
}
