use std::time::Duration;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use common::metrics;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::handlers::{create_order, delete_order, get_order, health, update_order};
use crate::state::AppState;

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    match metrics::gather_metrics() {
        Ok(metrics) => (StatusCode::OK, metrics),
        Err(e) => {
            tracing::error!("Failed to gather metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, String::from("Failed to gather metrics"))
        }
    }
}

/// Build the application router. Requests running longer than
/// `request_timeout` are dropped, which cancels their store transaction.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics_handler))

        // Orders
        .route("/api/v1/orders", post(create_order::handle))
        .route(
            "/api/v1/orders/:id",
            get(get_order::get_order_handler)
                .put(update_order::handle)
                .delete(delete_order::handle),
        )
        .route("/api/v1/orders/user/:user_id", get(get_order::get_user_order_handler))

        // Middleware
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
