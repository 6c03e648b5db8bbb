pub mod claims;
pub mod codec;
pub mod error;
pub mod gate;
pub mod issuer;
pub mod password;
pub mod resolver;
pub mod validator;

use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{Duration, Utc};

pub use claims::{Claims, RawClaims, TokenType, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use codec::ClaimCodec;
pub use error::AuthError;
pub use gate::{AuthGate, AuthenticatedPrincipal};
pub use issuer::{TokenIssuer, TokenPair};
pub use validator::TokenValidator;

use crate::config::SecurityConfig;
use crate::store::models::Principal;
use crate::store::PrincipalStore;

/// The authentication engine: codec, issuer, validator, and gate wired to
/// one secret and one principal store. Constructed once at startup and
/// injected into request handling through application state, so there is no
/// hidden module-level auth state and tests can build one around a fake
/// store.
pub struct AuthService {
    codec: ClaimCodec,
    issuer: TokenIssuer,
    validator: TokenValidator,
    gate: AuthGate,
    store: Arc<dyn PrincipalStore>,
    cookie_secure: bool,
}

impl AuthService {
    pub fn new(security: &SecurityConfig, store: Arc<dyn PrincipalStore>) -> Self {
        let codec = ClaimCodec::new(&security.jwt_secret);
        let validator = TokenValidator::new(codec.clone());
        Self {
            issuer: TokenIssuer::new(
                codec.clone(),
                Duration::minutes(security.access_token_expire_minutes),
                Duration::days(security.refresh_token_expire_days),
            ),
            gate: AuthGate::new(validator.clone(), store.clone()),
            codec,
            validator,
            store,
            cookie_secure: security.cookie_secure,
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    /// Run the authentication gate against a request's headers.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
    ) -> Result<AuthenticatedPrincipal, AuthError> {
        self.gate.authenticate(headers).await
    }

    /// Issue the access+refresh pair handed out after credential login.
    pub fn issue_login_pair(&self, username: &str) -> Result<TokenPair, AuthError> {
        self.issuer.issue_pair(username, Utc::now())
    }

    /// Exchange a valid refresh token for a new access+refresh pair.
    ///
    /// Re-checks that the subject still exists and is active. The old
    /// refresh token stays valid until its own expiry; there is no
    /// revocation store.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(TokenPair, Principal), AuthError> {
        let claims = self.validator.validate(refresh_token, TokenType::Refresh)?;

        let principal = self
            .store
            .find_by_username(&claims.sub)
            .await?
            .ok_or_else(|| AuthError::PrincipalNotFound(claims.sub.clone()))?;

        if !principal.is_active {
            return Err(AuthError::InactivePrincipal(principal.username));
        }

        let pair = self.issuer.issue_pair(&principal.username, Utc::now())?;
        Ok((pair, principal))
    }

    /// Decode a token without signature or claim verification, for the
    /// debug inspection endpoint only.
    pub fn inspect(&self, token: &str) -> Result<RawClaims, AuthError> {
        self.codec.decode(token, false)
    }

    pub fn access_cookie(&self, token: &str) -> String {
        self.build_cookie(
            ACCESS_TOKEN_COOKIE,
            token,
            self.issuer.access_ttl().num_seconds(),
        )
    }

    pub fn refresh_cookie(&self, token: &str) -> String {
        self.build_cookie(
            REFRESH_TOKEN_COOKIE,
            token,
            self.issuer.refresh_ttl().num_seconds(),
        )
    }

    /// Expired cookies that clear both tokens on logout.
    pub fn clear_cookies(&self) -> [String; 2] {
        [
            self.build_cookie(ACCESS_TOKEN_COOKIE, "", 0),
            self.build_cookie(REFRESH_TOKEN_COOKIE, "", 0),
        ]
    }

    fn build_cookie(&self, name: &str, value: &str, max_age_secs: i64) -> String {
        let secure = if self.cookie_secure { " Secure;" } else { "" };
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax;{} Max-Age={}",
            name, value, secure, max_age_secs
        )
    }
}
