//! Registration, login, and session endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{LoginRequest, RegisterRequest, UpdateProfileRequest, User};
use crate::AppState;

/// POST /api/auth/register - Create an account and establish the session.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<User> {
    if request.email.trim().is_empty() || request.username.trim().is_empty() {
        return Err(AppError::Validation(
            "Email and username are required".to_string(),
        ));
    }
    let user = state.engine.register(&request).await?;
    success(user)
}

/// POST /api/auth/login - Authenticate and establish the session.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<User> {
    let user = state.engine.login(&request).await?;
    success(user)
}

/// POST /api/auth/logout - Clear the session pointer.
pub async fn logout(State(state): State<AppState>) -> ApiResult<()> {
    state.engine.logout().await?;
    success(())
}

/// GET /api/auth/session - Current session, re-resolved against live users.
pub async fn session(State(state): State<AppState>) -> ApiResult<Option<User>> {
    let user = state.engine.current_session().await?;
    success(user)
}

/// PUT /api/auth/profile - Rename a non-admin user.
pub async fn update_profile(
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<User> {
    if request.username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    let user = state.engine.update_profile(&request).await?;
    success(user)
}

/// GET /api/users - List all persisted users.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = state.engine.users().await?;
    success(users)
}

/// GET /api/users/serial/{serial} - Look up one user by serial id.
pub async fn get_user_by_serial(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> ApiResult<User> {
    match state.engine.user_by_serial(&serial).await? {
        Some(user) => success(user),
        None => Err(AppError::NotFound(format!("User {} not found", serial))),
    }
}
