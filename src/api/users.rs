//! Admin-only user management API.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::AppState;
use super::error::{ApiError, ApiResult};
use super::types::{ApiResponse, CreateUserRequest, UserDto};
use crate::services::{ActionResult, AuthSession, CreateUser};

async fn require_admin(session: &AuthSession) -> Result<(), ApiError> {
    if session.is_current_user_admin().await {
        Ok(())
    } else {
        Err(ApiError::forbidden("Administrator access required"))
    }
}

/// GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> ApiResult<Json<ApiResponse<Vec<UserDto>>>> {
    require_admin(&session).await?;

    let users = state.users().list_users().await?;
    let users: Vec<UserDto> = users.into_iter().map(UserDto::from).collect();
    Ok(Json(ApiResponse::success(users)))
}

/// POST /api/users
///
/// Business failures (duplicate username, too-short password) come back as a
/// 200 with `success: false` and a message suitable for display.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<Json<ActionResult>> {
    require_admin(&session).await?;

    let result = state
        .users()
        .create_user(CreateUser {
            username: request.username,
            password: request.password,
            email: request.email,
            full_name: request.full_name,
            is_admin: request.is_admin,
        })
        .await?;

    Ok(Json(result))
}

/// DELETE /api/users/{username}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Path(username): Path<String>,
) -> ApiResult<Json<ActionResult>> {
    require_admin(&session).await?;

    let result = state.users().delete_user(&username).await?;
    Ok(Json(result))
}
