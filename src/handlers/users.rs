use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::UserResponse;
use crate::auth::password;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;
use crate::store::{NewUser, PrincipalStore, UserStore, UserUpdate};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// GET /api/v1/users - list users (requires `user:read`).
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<UserResponse>> {
    current.require_permission("user:read")?;

    let users = state.users.list_users(params.skip, params.limit).await?;
    Ok(ApiResponse::success(
        users.iter().map(UserResponse::from_principal).collect(),
    ))
}

/// GET /api/v1/users/:user_id - fetch one user (requires `user:read`).
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<UserResponse> {
    current.require_permission("user:read")?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::success(UserResponse::from_principal(&user)))
}

/// POST /api/v1/users - create a user (requires `user:create`).
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult<UserResponse> {
    current.require_permission("user:create")?;

    tracing::info!(
        created_by = %current.principal.username,
        new_username = %body.username,
        "user creation attempt"
    );

    if state.users.find_by_username(&body.username).await?.is_some() {
        return Err(ApiError::bad_request("Username already registered"));
    }
    if state.users.find_by_email(&body.email).await?.is_some() {
        return Err(ApiError::bad_request("Email already registered"));
    }

    if let Some(role_id) = body.role_id {
        if state.users.find_role_by_id(role_id).await?.is_none() {
            return Err(ApiError::bad_request("Role not found"));
        }
    }

    let user = state
        .users
        .create_user(NewUser {
            username: body.username,
            email: body.email,
            password_hash: password::hash_password(&body.password)?,
            role_id: body.role_id,
            is_active: true,
        })
        .await?;

    tracing::info!(
        created_by = %current.principal.username,
        new_user_id = %user.id,
        "user created"
    );

    Ok(ApiResponse::created(UserResponse::from_principal(&user)))
}

/// PUT /api/v1/users/:user_id - update a user (requires `user:update`).
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<UserResponse> {
    current.require_permission("user:update")?;

    if state.users.find_by_id(user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    if let Some(username) = &body.username {
        if let Some(existing) = state.users.find_by_username(username).await? {
            if existing.id != user_id {
                return Err(ApiError::bad_request("Username already taken"));
            }
        }
    }
    if let Some(email) = &body.email {
        if let Some(existing) = state.users.find_by_email(email).await? {
            if existing.id != user_id {
                return Err(ApiError::bad_request("Email already taken"));
            }
        }
    }
    if let Some(role_id) = body.role_id {
        if state.users.find_role_by_id(role_id).await?.is_none() {
            return Err(ApiError::bad_request("Role not found"));
        }
    }

    let password_hash = match &body.password {
        Some(password) => Some(password::hash_password(password)?),
        None => None,
    };

    let user = state
        .users
        .update_user(
            user_id,
            UserUpdate {
                username: body.username,
                email: body.email,
                password_hash,
                role_id: body.role_id,
                is_active: body.is_active,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(UserResponse::from_principal(&user)))
}

/// DELETE /api/v1/users/:user_id - delete a user (requires `user:delete`).
/// Self-deletion is refused.
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Value> {
    current.require_permission("user:delete")?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if user.id == current.principal.id {
        return Err(ApiError::bad_request("Cannot delete your own account"));
    }

    state.users.delete_user(user_id).await?;

    tracing::warn!(
        deleted_by = %current.principal.username,
        deleted_username = %user.username,
        "user deleted"
    );

    Ok(ApiResponse::success(json!({
        "message": "User deleted successfully"
    })))
}
