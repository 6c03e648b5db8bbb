use axum::{extract::State, http::HeaderMap};
use chrono::DateTime;
use serde_json::{json, Value};

use crate::auth::gate;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

/// GET /api/v1/token/info - decode the presented token without verification
/// for debugging. The route itself still sits behind the auth gate, so only
/// an authenticated caller can inspect a token.
pub async fn get_token_info(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    headers: HeaderMap,
) -> ApiResult<Value> {
    let token = gate::extract_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Could not validate credentials"))?;

    let raw = state.auth.inspect(&token)?;

    let mut token_info = serde_json::to_value(&raw)
        .map_err(|e| ApiError::internal_server_error(e.to_string()))?;
    if let Some(obj) = token_info.as_object_mut() {
        for (claim, key) in [("exp", "exp_readable"), ("iat", "iat_readable"), ("nbf", "nbf_readable")] {
            if let Some(ts) = obj.get(claim).and_then(Value::as_i64) {
                if let Some(readable) = DateTime::from_timestamp(ts, 0) {
                    obj.insert(key.to_string(), json!(readable.to_rfc3339()));
                }
            }
        }
    }

    Ok(ApiResponse::success(json!({
        "user": {
            "id": principal.principal.id,
            "username": principal.principal.username,
            "role": principal.principal.role_name(),
        },
        "token": token_info,
    })))
}
