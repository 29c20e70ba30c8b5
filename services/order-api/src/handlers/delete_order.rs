use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn handle(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    info!("Received delete for order: {}", order_id);

    state.orders.delete_order(order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
