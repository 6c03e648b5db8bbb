pub mod auth;
pub mod me;
pub mod roles;
pub mod token_info;
pub mod users;

use axum::http::{HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::resolver;
use crate::store::models::{Principal, Role};

/// User profile shape shared by the auth, me and users endpoints.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Option<String>,
    pub permissions: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn from_principal(principal: &Principal) -> Self {
        let mut permissions: Vec<String> = resolver::permissions(principal).into_iter().collect();
        permissions.sort();

        Self {
            id: principal.id,
            username: principal.username.clone(),
            email: principal.email.clone(),
            role: principal.role_name().map(String::from),
            permissions,
            is_active: principal.is_active,
            created_at: principal.created_at,
        }
    }
}

/// Role shape returned by the roles endpoints.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl RoleResponse {
    pub fn from_role(role: &Role) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
            description: role.description.clone(),
            permissions: role.permissions.iter().map(|p| p.name.clone()).collect(),
            created_at: role.created_at,
        }
    }
}

/// Client address for rate limiting, taken from the forwarding header a
/// fronting proxy sets. Direct connections without one share a bucket.
pub(crate) fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v: &HeaderValue| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
