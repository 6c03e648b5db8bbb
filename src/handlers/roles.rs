use axum::extract::{Path, State};
use uuid::Uuid;

use super::RoleResponse;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;
use crate::store::UserStore;

/// GET /api/v1/roles - list roles with their grants (requires `role:read`).
pub async fn list_roles(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
) -> ApiResult<Vec<RoleResponse>> {
    current.require_permission("role:read")?;

    let roles = state.users.list_roles().await?;
    Ok(ApiResponse::success(
        roles.iter().map(RoleResponse::from_role).collect(),
    ))
}

/// GET /api/v1/roles/:role_id - fetch one role (requires `role:read`).
pub async fn get_role(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(role_id): Path<Uuid>,
) -> ApiResult<RoleResponse> {
    current.require_permission("role:read")?;

    let role = state
        .users
        .find_role_by_id(role_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Role not found"))?;
    Ok(ApiResponse::success(RoleResponse::from_role(&role)))
}
