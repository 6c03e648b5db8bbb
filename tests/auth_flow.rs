//! End-to-end authentication flow tests against the real router, backed by
//! the in-memory user store.

mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn health_endpoint_responds() {
    let ctx = common::test_app();

    let response = common::get(&ctx.app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn login_sets_cookies_and_returns_profile() {
    let ctx = common::test_app();

    let (body, access, refresh) = common::login(&ctx.app, "admin", "admin123").await;

    assert_eq!(body["data"]["token_type"], "bearer");
    assert_eq!(body["data"]["user"]["username"], "admin");
    assert_eq!(body["data"]["user"]["role"], "SuperUser");
    assert!(body["data"]["user"]["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p == "user:delete"));

    assert!(access.starts_with("access_token="));
    assert!(refresh.starts_with("refresh_token="));
}

#[tokio::test]
async fn login_cookies_are_http_only() {
    let ctx = common::test_app();

    let response = common::post_json(
        &ctx.app,
        "/api/v1/auth/login",
        json!({ "username": "admin", "password": "admin123" }),
    )
    .await;

    for cookie in common::set_cookies(&response) {
        assert!(cookie.contains("HttpOnly"), "not HttpOnly: {cookie}");
        assert!(cookie.contains("SameSite=Lax"), "not SameSite: {cookie}");
    }
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let ctx = common::test_app();

    let response = common::post_json(
        &ctx.app,
        "/api/v1/auth/login",
        json!({ "username": "admin", "password": "wrong" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Incorrect username or password");
}

#[tokio::test]
async fn login_with_unknown_user_gets_the_same_message() {
    let ctx = common::test_app();

    let response = common::post_json(
        &ctx.app,
        "/api/v1/auth/login",
        json!({ "username": "nobody", "password": "whatever" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Incorrect username or password");
}

#[tokio::test]
async fn deactivated_account_cannot_log_in() {
    let ctx = common::test_app();

    let response = common::post_json(
        &ctx.app,
        "/api/v1/auth/login",
        json!({ "username": "carol", "password": "carol123" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "User account is deactivated");
}

#[tokio::test]
async fn me_authenticates_via_cookie() {
    let ctx = common::test_app();
    let (_, access, _) = common::login(&ctx.app, "alice", "alice123").await;

    let response = common::get_with_cookie(&ctx.app, "/api/v1/me", &access).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["role"], "User");
}

#[tokio::test]
async fn me_authenticates_via_bearer_header() {
    let ctx = common::test_app();
    let (body, _, _) = common::login(&ctx.app, "alice", "alice123").await;
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    let response = common::get_with_bearer(&ctx.app, "/api/v1/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["data"]["username"], "alice");
}

#[tokio::test]
async fn missing_token_is_rejected_without_a_store_lookup() {
    let ctx = common::test_app();

    let response = common::get(&ctx.app, "/api/v1/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Could not validate credentials");

    // The gate short-circuits before touching the principal store.
    assert_eq!(ctx.store.lookup_count(), 0);
}

#[tokio::test]
async fn garbage_token_is_rejected_with_the_generic_message() {
    let ctx = common::test_app();

    let response = common::get_with_bearer(&ctx.app, "/api/v1/me", "not.a.token").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Could not validate credentials");
}

#[tokio::test]
async fn refresh_token_cannot_authenticate_requests() {
    let ctx = common::test_app();
    let (_, _, refresh) = common::login(&ctx.app, "alice", "alice123").await;

    // Present the refresh token where the access token belongs.
    let refresh_value = refresh.trim_start_matches("refresh_token=");
    let cookie = format!("access_token={}", refresh_value);

    let response = common::get_with_cookie(&ctx.app, "/api/v1/me", &cookie).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_issues_a_working_token_pair() {
    let ctx = common::test_app();
    let (_, _, refresh) = common::login(&ctx.app, "alice", "alice123").await;

    let response = common::send(
        &ctx.app,
        axum::http::Request::builder()
            .uri("/api/v1/auth/refresh")
            .method(axum::http::Method::POST)
            .header(axum::http::header::COOKIE, &refresh)
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let new_access = common::cookie_pair(&response, "access_token").unwrap();
    assert!(common::cookie_pair(&response, "refresh_token").is_some());

    let body = common::body_json(response).await;
    assert_eq!(body["data"]["user"]["username"], "alice");

    // The newly minted access cookie authenticates.
    let me = common::get_with_cookie(&ctx.app, "/api/v1/me", &new_access).await;
    assert_eq!(me.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_without_cookie_is_rejected() {
    let ctx = common::test_app();

    let response = common::post_json(&ctx.app, "/api/v1/auth/refresh", json!({})).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Refresh token not found");
}

#[tokio::test]
async fn refresh_rejects_an_access_token() {
    let ctx = common::test_app();
    let (_, access, _) = common::login(&ctx.app, "alice", "alice123").await;

    // An access token in the refresh slot must not mint new tokens.
    let access_value = access.trim_start_matches("access_token=");
    let cookie = format!("refresh_token={}", access_value);

    let response = common::send(
        &ctx.app,
        axum::http::Request::builder()
            .uri("/api/v1/auth/refresh")
            .method(axum::http::Method::POST)
            .header(axum::http::header::COOKIE, &cookie)
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Could not validate credentials");
}

#[tokio::test]
async fn logout_expires_both_cookies() {
    let ctx = common::test_app();

    let response = common::post_json(&ctx.app, "/api/v1/auth/logout", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = common::set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    for cookie in cookies {
        assert!(cookie.contains("Max-Age=0"), "not expired: {cookie}");
    }
}

#[tokio::test]
async fn register_creates_an_account_with_the_default_role() {
    let ctx = common::test_app();

    let response = common::post_json(
        &ctx.app,
        "/api/v1/auth/register",
        json!({
            "username": "dave",
            "email": "dave@example.com",
            "password": "dave-password"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::body_json(response).await;
    assert_eq!(body["data"]["user"]["role"], "User");

    // The fresh account can log in immediately.
    let (body, _, _) = common::login(&ctx.app, "dave", "dave-password").await;
    assert_eq!(body["data"]["user"]["username"], "dave");
}

#[tokio::test]
async fn register_rejects_duplicate_username() {
    let ctx = common::test_app();

    let response = common::post_json(
        &ctx.app,
        "/api/v1/auth/register",
        json!({
            "username": "alice",
            "email": "alice2@example.com",
            "password": "whatever"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Username already registered");
}

#[tokio::test]
async fn token_info_reports_claims() {
    let ctx = common::test_app();
    let (body, _, _) = common::login(&ctx.app, "alice", "alice123").await;
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    let response = common::get_with_bearer(&ctx.app, "/api/v1/token/info", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["data"]["user"]["username"], "alice");
    assert_eq!(body["data"]["token"]["sub"], "alice");
    assert_eq!(body["data"]["token"]["type"], "access");
    assert_eq!(body["data"]["token"]["iss"], "saas-api");
    assert!(body["data"]["token"]["exp_readable"].is_string());
}

#[tokio::test]
async fn security_headers_are_stamped_on_responses() {
    let ctx = common::test_app();

    let response = common::get(&ctx.app, "/health").await;
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}
