//! Wallet mutation endpoints.

use axum::{extract::State, Json};

use super::{success, ApiResult};
use crate::models::{CreditRequest, DebitRequest, SerialRequest, User, ZeroBalanceRequest};
use crate::AppState;

/// POST /api/wallet/credit - Add to one currency balance.
pub async fn credit(
    State(state): State<AppState>,
    Json(request): Json<CreditRequest>,
) -> ApiResult<User> {
    let user = state
        .engine
        .credit_balance(&request.serial_id, request.currency, request.amount)
        .await?;
    success(user)
}

/// POST /api/wallet/debit - Guarded USD deduction.
pub async fn debit(
    State(state): State<AppState>,
    Json(request): Json<DebitRequest>,
) -> ApiResult<User> {
    let user = state
        .engine
        .debit_balance(&request.user_id, request.amount)
        .await?;
    success(user)
}

/// POST /api/wallet/zero - Zero one currency balance.
pub async fn zero(
    State(state): State<AppState>,
    Json(request): Json<ZeroBalanceRequest>,
) -> ApiResult<User> {
    let user = state
        .engine
        .zero_balance(&request.serial_id, request.currency)
        .await?;
    success(user)
}

/// POST /api/wallet/wipe - Zero both currency balances.
pub async fn wipe(
    State(state): State<AppState>,
    Json(request): Json<SerialRequest>,
) -> ApiResult<User> {
    let user = state.engine.wipe_balances(&request.serial_id).await?;
    success(user)
}
