use std::collections::HashSet;
use std::sync::Arc;

use axum::http::{header, HeaderMap};

use super::claims::{TokenType, ACCESS_TOKEN_COOKIE};
use super::error::AuthError;
use super::resolver;
use super::validator::TokenValidator;
use crate::error::ApiError;
use crate::store::models::Principal;
use crate::store::PrincipalStore;

/// A validated principal plus its resolved permission set. Built by the gate
/// on success, attached to the request, and dropped when the request ends.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal {
    pub principal: Principal,
    pub permissions: HashSet<String>,
}

impl AuthenticatedPrincipal {
    pub fn new(principal: Principal) -> Self {
        let permissions = resolver::permissions(&principal);
        Self {
            principal,
            permissions,
        }
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }

    pub fn has_any_role(&self, role_names: &[&str]) -> bool {
        resolver::has_any_role(&self.principal, role_names)
    }

    /// Route-level guard: 403 with the original's message when the
    /// permission is not granted.
    pub fn require_permission(&self, name: &str) -> Result<(), ApiError> {
        if self.has_permission(name) {
            Ok(())
        } else {
            tracing::warn!(
                username = %self.principal.username,
                permission = name,
                "permission denied"
            );
            Err(ApiError::forbidden(format!(
                "Access denied. Required permission: {}",
                name
            )))
        }
    }

    pub fn require_any_role(&self, role_names: &[&str]) -> Result<(), ApiError> {
        if self.has_any_role(role_names) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "Access denied. Required roles: {}",
                role_names.join(", ")
            )))
        }
    }
}

/// Turns a raw request into an [`AuthenticatedPrincipal`] or a rejection.
///
/// Single pass per request: extract the token (cookie preferred, bearer
/// header fallback), validate it as an access token, then resolve and check
/// the principal. No token short-circuits before any store access.
pub struct AuthGate {
    validator: TokenValidator,
    store: Arc<dyn PrincipalStore>,
}

impl AuthGate {
    pub fn new(validator: TokenValidator, store: Arc<dyn PrincipalStore>) -> Self {
        Self { validator, store }
    }

    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
    ) -> Result<AuthenticatedPrincipal, AuthError> {
        let token = extract_token(headers).ok_or(AuthError::MissingToken)?;

        let claims = self.validator.validate(&token, TokenType::Access)?;

        let principal = self
            .store
            .find_by_username(&claims.sub)
            .await?
            .ok_or_else(|| AuthError::PrincipalNotFound(claims.sub.clone()))?;

        if !principal.is_active {
            return Err(AuthError::InactivePrincipal(principal.username));
        }

        Ok(AuthenticatedPrincipal::new(principal))
    }
}

/// Read a named cookie from a request's headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| token_from_cookie_header(cookies, name))
        .map(String::from)
}

/// Token extraction: the access-token cookie wins, `Authorization: Bearer`
/// is the fallback for non-browser clients.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = cookie_value(headers, ACCESS_TOKEN_COOKIE) {
        return Some(token);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token_from_header)
        .map(String::from)
}

fn token_from_cookie_header<'a>(cookie_header: &'a str, cookie_name: &str) -> Option<&'a str> {
    cookie_header.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        if name.trim() == cookie_name && !value.trim().is_empty() {
            Some(value.trim())
        } else {
            None
        }
    })
}

fn bearer_token_from_header(header_value: &str) -> Option<&str> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = parts.next()?;
    if token.is_empty() || parts.next().is_some() {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token_from_header("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token_from_header("bearer   token123"), Some("token123"));

        for bad in ["", "Bearer", "Bearer ", "Token something", "Bearer a b"] {
            assert_eq!(bearer_token_from_header(bad), None, "{bad:?} should fail");
        }
    }

    #[test]
    fn cookie_header_parsing() {
        let header = "theme=dark; access_token=tok123; other=x";
        assert_eq!(token_from_cookie_header(header, ACCESS_TOKEN_COOKIE), Some("tok123"));
        assert_eq!(token_from_cookie_header("theme=dark", ACCESS_TOKEN_COOKIE), None);
        assert_eq!(token_from_cookie_header("access_token=", ACCESS_TOKEN_COOKIE), None);
    }

    #[test]
    fn cookie_is_preferred_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("access_token=from-cookie"),
        );
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn header_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));

        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
