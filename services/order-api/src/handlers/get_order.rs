use axum::{
    extract::{Path, State},
    Json,
};
use domain::Order;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Get a single order by ID
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<Order>, ApiError> {
    info!("Fetching order: {}", order_id);

    let order = state.orders.get_order_by_id(order_id).await?;
    Ok(Json(order))
}

/// Get the most recent order placed by a user
pub async fn get_user_order_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Order>, ApiError> {
    info!("Fetching latest order for user: {}", user_id);

    let order = state.orders.get_order_by_user_id(user_id).await?;
    Ok(Json(order))
}
