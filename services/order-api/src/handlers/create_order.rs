use axum::{extract::State, http::StatusCode, Json};
use domain::Order;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Create an order; the response carries the stored ids and computed total
pub async fn handle(
    State(state): State<AppState>,
    Json(order): Json<Order>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    info!(
        "Received create order request for user: {} ({} items)",
        order.user_id,
        order.items.len()
    );

    let created = state.orders.create_order(order).await?;

    Ok((StatusCode::CREATED, Json(created)))
}
