use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{client_ip, UserResponse};
use crate::auth::{gate, password, REFRESH_TOKEN_COOKIE};
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;
use crate::store::{NewUser, PrincipalStore, UserStore};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

/// POST /api/v1/auth/login - verify credentials, set the HTTP-only token
/// cookies and return the access token for header-based clients.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers);
    if state.rate_limiting_enabled && !state.limiter.check(&format!("login:{}", ip)) {
        return Err(ApiError::too_many_requests("Too many login attempts"));
    }

    tracing::info!(username = %body.username, ip = %ip, "login attempt");

    let user = state.users.find_by_username(&body.username).await?;
    let user = match user {
        Some(user) if password::verify_password(&body.password, &user.password_hash) => user,
        _ => {
            state.limiter.record_failed_login(&ip, &body.username);
            tracing::warn!(username = %body.username, ip = %ip, "failed login attempt");
            return Err(ApiError::unauthorized("Incorrect username or password"));
        }
    };

    if !user.is_active {
        return Err(ApiError::unauthorized("User account is deactivated"));
    }

    let pair = state.auth.issue_login_pair(&user.username)?;
    state.limiter.clear_failed_attempts(&ip, &body.username);

    tracing::info!(
        username = %user.username,
        role = user.role_name().unwrap_or("-"),
        "successful login"
    );

    Ok((
        AppendHeaders([
            (SET_COOKIE, state.auth.access_cookie(&pair.access)),
            (SET_COOKIE, state.auth.refresh_cookie(&pair.refresh)),
        ]),
        ApiResponse::success(LoginResponse {
            access_token: pair.access,
            token_type: "bearer".to_string(),
            user: UserResponse::from_principal(&user),
        }),
    ))
}

/// POST /api/v1/auth/register - self-service account creation with the
/// default role.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers);
    if state.rate_limiting_enabled && !state.limiter.check(&format!("register:{}", ip)) {
        return Err(ApiError::too_many_requests("Too many requests"));
    }

    if state.users.find_by_username(&body.username).await?.is_some() {
        return Err(ApiError::bad_request("Username already registered"));
    }
    if state.users.find_by_email(&body.email).await?.is_some() {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let default_role = state.users.find_role_by_name("User").await?;
    let user = state
        .users
        .create_user(NewUser {
            username: body.username,
            email: body.email,
            password_hash: password::hash_password(&body.password)?,
            role_id: default_role.map(|r| r.id),
            is_active: true,
        })
        .await?;

    tracing::info!(username = %user.username, "user registered");

    Ok(ApiResponse::created(RegisterResponse {
        message: "User registered successfully".to_string(),
        user: UserResponse::from_principal(&user),
    }))
}

/// POST /api/v1/auth/refresh - exchange the refresh-token cookie for a new
/// token pair. The old refresh token is not revoked; it simply ages out.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers);
    if state.rate_limiting_enabled && !state.limiter.check(&format!("refresh:{}", ip)) {
        return Err(ApiError::too_many_requests("Too many requests"));
    }

    let refresh_token = gate::cookie_value(&headers, REFRESH_TOKEN_COOKIE)
        .ok_or_else(|| ApiError::unauthorized("Refresh token not found"))?;

    let (pair, user) = state.auth.refresh(&refresh_token).await?;

    tracing::info!(username = %user.username, "session refreshed");

    Ok((
        AppendHeaders([
            (SET_COOKIE, state.auth.access_cookie(&pair.access)),
            (SET_COOKIE, state.auth.refresh_cookie(&pair.refresh)),
        ]),
        ApiResponse::success(LoginResponse {
            access_token: pair.access,
            token_type: "bearer".to_string(),
            user: UserResponse::from_principal(&user),
        }),
    ))
}

/// POST /api/v1/auth/logout - clear both token cookies.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let [access, refresh] = state.auth.clear_cookies();
    (
        AppendHeaders([(SET_COOKIE, access), (SET_COOKIE, refresh)]),
        ApiResponse::success(serde_json::json!({
            "message": "Successfully logged out"
        })),
    )
}
