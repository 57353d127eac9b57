//! Order ledger endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::models::{CreateOrderRequest, DashboardStats, Order, UpdateOrderRequest, WipeOutcome};
use crate::AppState;

/// GET /api/orders - Full ledger, most recent first.
pub async fn list_orders(State(state): State<AppState>) -> ApiResult<Vec<Order>> {
    let orders = state.engine.orders().await?;
    success(orders)
}

/// POST /api/orders - Submit a new top-up order.
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<Order> {
    let order = state.engine.create_order(&request).await?;
    success(order)
}

/// PUT /api/orders/{id} - Partial-field update of one order.
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateOrderRequest>,
) -> ApiResult<Order> {
    let order = state.engine.update_order(&id, &request).await?;
    success(order)
}

/// DELETE /api/orders - Owner-only global wipe.
pub async fn wipe_orders(State(state): State<AppState>) -> ApiResult<WipeOutcome> {
    let outcome = state.engine.wipe_all_orders().await?;
    success(outcome)
}

/// GET /api/stats - Derived dashboard aggregates.
pub async fn stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    let stats = state.engine.stats().await?;
    success(stats)
}
