use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Issuer stamped into every token and required back on validation.
pub const ISSUER: &str = "saas-api";

/// Audience stamped into every token and required back on validation.
pub const AUDIENCE: &str = "saas-client";

/// Cookie names used for browser token transport.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// The two token kinds this service issues. Access tokens authenticate API
/// requests; refresh tokens are only accepted by the refresh exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully validated claim set. Only the token validator constructs this, after
/// every claim has been checked, so consumers never see a partial token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Principal identifier (username).
    pub sub: String,
    /// Expiry instant (unix seconds).
    pub exp: i64,
    /// Issued-at instant (unix seconds).
    pub iat: i64,
    /// Not-before instant (unix seconds).
    pub nbf: i64,
    /// Issuer, always [`ISSUER`].
    pub iss: String,
    /// Audience, always [`AUDIENCE`].
    pub aud: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Unique-ish token id: `{type}_{unix_seconds}_{subject}`.
    pub jti: String,
}

impl Claims {
    /// Build the claim set for a freshly issued token: `iat = nbf = now`,
    /// `exp = now + ttl`, fixed issuer/audience.
    pub fn issue(subject: &str, token_type: TokenType, now: DateTime<Utc>, ttl: Duration) -> Self {
        let issued_at = now.timestamp();
        Self {
            sub: subject.to_string(),
            exp: (now + ttl).timestamp(),
            iat: issued_at,
            nbf: issued_at,
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
            token_type,
            jti: format!("{}_{}_{}", token_type, issued_at, subject),
        }
    }
}

/// Claim set as it comes off the wire, before validation. Every field is
/// optional so a token missing claims decodes cleanly and the validator can
/// report exactly which names are absent instead of a generic parse failure.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RawClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl RawClaims {
    /// Names of required claims not present, in canonical reporting order.
    pub fn missing_claims(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.sub.is_none() {
            missing.push("sub");
        }
        if self.exp.is_none() {
            missing.push("exp");
        }
        if self.iat.is_none() {
            missing.push("iat");
        }
        if self.nbf.is_none() {
            missing.push("nbf");
        }
        if self.token_type.is_none() {
            missing.push("type");
        }
        if self.jti.is_none() {
            missing.push("jti");
        }
        if self.iss.is_none() {
            missing.push("iss");
        }
        if self.aud.is_none() {
            missing.push("aud");
        }
        missing.into_iter().map(String::from).collect()
    }
}
