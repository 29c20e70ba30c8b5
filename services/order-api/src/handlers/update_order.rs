use axum::{
    extract::{Path, State},
    Json,
};
use domain::Order;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Replace the items of an existing order
pub async fn handle(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(mut order): Json<Order>,
) -> Result<Json<Order>, ApiError> {
    info!("Received update for order: {}", order_id);

    // The path names the order; an id in the body is ignored.
    order.id = order_id;

    let updated = state.orders.update_order(order).await?;
    Ok(Json(updated))
}
