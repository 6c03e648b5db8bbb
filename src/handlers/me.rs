use super::UserResponse;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

/// GET /api/v1/me - profile of the authenticated principal.
pub async fn get_me(CurrentUser(principal): CurrentUser) -> ApiResult<UserResponse> {
    Ok(ApiResponse::success(UserResponse::from_principal(
        &principal.principal,
    )))
}
