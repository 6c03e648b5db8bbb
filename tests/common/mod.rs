#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use saas_api::config::{
    ApiConfig, AppConfig, DatabaseConfig, Environment, SecurityConfig, ServerConfig,
};
use saas_api::routes::build_router;
use saas_api::state::AppState;
use saas_api::store::memory::MemoryUserStore;
use saas_api::store::models::Principal;

pub const TEST_SECRET: &str = "integration-test-secret-minimum-32-chars-long";

/// App wired to a seeded in-memory store, plus the store itself so tests can
/// observe it directly.
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryUserStore>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        environment: Environment::Development,
        server: ServerConfig { port: 0 },
        database: DatabaseConfig {
            url: None,
            max_connections: 1,
            connection_timeout: 1,
        },
        api: ApiConfig {
            enable_rate_limiting: false,
            rate_limit_requests: 1000,
            rate_limit_window_secs: 60,
        },
        security: SecurityConfig {
            jwt_secret: TEST_SECRET.to_string(),
            access_token_expire_minutes: 30,
            refresh_token_expire_days: 7,
            cookie_secure: false,
            cors_origins: vec![],
        },
    }
}

/// Seeded store: `admin`/`admin123` (SuperUser, from the seed data) plus
/// `alice`/`alice123` (User) and the deactivated `carol`/`carol123`.
pub fn test_app() -> TestContext {
    let store = Arc::new(MemoryUserStore::seeded());

    let user_role = store.role_named("User");
    store.insert_user(test_user("alice", "alice123", user_role.clone(), true));
    store.insert_user(test_user("carol", "carol123", user_role, false));

    let state = AppState::new(&test_config(), store.clone());
    TestContext {
        app: build_router(state),
        store,
    }
}

fn test_user(
    username: &str,
    password: &str,
    role: Option<saas_api::store::models::Role>,
    is_active: bool,
) -> Principal {
    Principal {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        // Low cost keeps the fixtures fast; production hashing uses the default.
        password_hash: bcrypt::hash(password, 4).expect("hash test password"),
        is_active,
        role,
        created_at: Utc::now(),
        updated_at: None,
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("request")
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(
        app,
        Request::builder()
            .uri(uri)
            .method(Method::GET)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn get_with_cookie(app: &Router, uri: &str, cookie: &str) -> Response<Body> {
    send(
        app,
        Request::builder()
            .uri(uri)
            .method(Method::GET)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn get_with_bearer(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        Request::builder()
            .uri(uri)
            .method(Method::GET)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send(
        app,
        Request::builder()
            .uri(uri)
            .method(Method::POST)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// All Set-Cookie values on a response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(String::from)
        .collect()
}

/// The bare `name=value` pair of a named cookie from a response.
pub fn cookie_pair(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with(&format!("{}=", name)))
        .and_then(|c| c.split(';').next().map(String::from))
}

/// Log in and return the parsed body plus the two token cookie pairs.
pub async fn login(app: &Router, username: &str, password: &str) -> (Value, String, String) {
    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "username": username, "password": password }),
    )
    .await;

    assert_eq!(response.status(), axum::http::StatusCode::OK, "login failed");
    let access = cookie_pair(&response, "access_token").expect("access cookie");
    let refresh = cookie_pair(&response, "refresh_token").expect("refresh cookie");
    let body = body_json(response).await;
    (body, access, refresh)
}
