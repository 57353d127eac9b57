//! Broadcast notification endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::models::{BroadcastRequest, SystemNotification, WipeOutcome};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsQuery {
    /// Filter by recipient serial id
    #[serde(default)]
    pub user_id: Option<String>,
}

/// GET /api/notifications - All notifications, optionally for one recipient.
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationsQuery>,
) -> ApiResult<Vec<SystemNotification>> {
    let notifications = match query.user_id {
        Some(serial) => state.engine.notifications_for(&serial).await?,
        None => state.engine.notifications().await?,
    };
    success(notifications)
}

/// POST /api/notifications/broadcast - Fan out to all eligible users.
/// Returns the number of records created.
pub async fn broadcast(
    State(state): State<AppState>,
    Json(request): Json<BroadcastRequest>,
) -> ApiResult<usize> {
    let count = state.engine.broadcast(&request).await?;
    success(count)
}

/// PUT /api/notifications/{id}/read - Local-only read flag flip.
pub async fn mark_read(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.engine.mark_notification_read(&id).await?;
    success(())
}

/// DELETE /api/notifications - Owner-only global wipe.
pub async fn wipe_notifications(State(state): State<AppState>) -> ApiResult<WipeOutcome> {
    let outcome = state.engine.wipe_all_notifications().await?;
    success(outcome)
}
