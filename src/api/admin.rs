//! Team management and moderation endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::models::{
    BanRequest, CreateSubAdminRequest, ResetPasswordRequest, SerialRequest,
    UpdatePermissionsRequest, User,
};
use crate::AppState;

/// POST /api/admin/sub-admins - Create a sub-admin with a capability set.
pub async fn create_sub_admin(
    State(state): State<AppState>,
    Json(request): Json<CreateSubAdminRequest>,
) -> ApiResult<()> {
    state.engine.create_sub_admin(&request).await?;
    success(())
}

/// PUT /api/admin/permissions - Replace a user's capability set wholesale.
pub async fn update_permissions(
    State(state): State<AppState>,
    Json(request): Json<UpdatePermissionsRequest>,
) -> ApiResult<()> {
    state
        .engine
        .update_permissions(&request.user_id, request.permissions)
        .await?;
    success(())
}

/// POST /api/admin/ban - Apply a ban action (none/permanent/temporary).
pub async fn set_ban_status(
    State(state): State<AppState>,
    Json(request): Json<BanRequest>,
) -> ApiResult<User> {
    let user = state.engine.set_ban_status(&request).await?;
    success(user)
}

/// POST /api/admin/deactivate - Flip the manual deactivation switch.
pub async fn toggle_deactivation(
    State(state): State<AppState>,
    Json(request): Json<SerialRequest>,
) -> ApiResult<User> {
    let user = state.engine.toggle_deactivation(&request.serial_id).await?;
    success(user)
}

/// POST /api/admin/reset-password - Set a new password, flag must-change.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResult<()> {
    state
        .engine
        .reset_password(&request.serial_id, &request.new_password)
        .await?;
    success(())
}

/// POST /api/admin/remove-privileges - Demote a sub-admin.
pub async fn remove_privileges(
    State(state): State<AppState>,
    Json(request): Json<SerialRequest>,
) -> ApiResult<User> {
    let user = state
        .engine
        .remove_admin_privileges(&request.serial_id)
        .await?;
    success(user)
}

/// DELETE /api/admin/users/{serial} - Permanently delete an account.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> ApiResult<()> {
    state.engine.delete_permanently(&serial).await?;
    success(())
}

/// POST /api/admin/wipe-coins - Owner-only: zero every coin balance.
pub async fn wipe_all_coins(State(state): State<AppState>) -> ApiResult<usize> {
    let count = state.engine.wipe_all_coins().await?;
    success(count)
}
