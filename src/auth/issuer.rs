use chrono::{DateTime, Duration, Utc};

use super::claims::{Claims, TokenType};
use super::codec::ClaimCodec;
use super::error::AuthError;

/// A freshly issued access/refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Produces signed tokens for a subject. TTL policy: explicit override if
/// given, otherwise the per-type default. Two tokens issued for the same
/// subject and type within the same second share a `jti`; there is no
/// revocation store, so nothing depends on `jti` uniqueness.
#[derive(Clone)]
pub struct TokenIssuer {
    codec: ClaimCodec,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(codec: ClaimCodec, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            codec,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue a single token of the given type at `now`.
    pub fn issue(
        &self,
        subject: &str,
        token_type: TokenType,
        now: DateTime<Utc>,
        ttl_override: Option<Duration>,
    ) -> Result<String, AuthError> {
        let ttl = ttl_override.unwrap_or_else(|| self.default_ttl(token_type));
        let claims = Claims::issue(subject, token_type, now, ttl);
        self.codec.encode(&claims)
    }

    /// Issue the access+refresh pair handed out at login and refresh time.
    pub fn issue_pair(&self, subject: &str, now: DateTime<Utc>) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(subject, TokenType::Access, now, None)?,
            refresh: self.issue(subject, TokenType::Refresh, now, None)?,
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    fn default_ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            ClaimCodec::new("test-secret-for-unit-tests-minimum-32-chars-long"),
            Duration::minutes(30),
            Duration::days(7),
        )
    }

    fn decode(issuer: &TokenIssuer, token: &str) -> crate::auth::claims::RawClaims {
        issuer.codec.decode(token, true).unwrap()
    }

    #[test]
    fn per_type_ttl_defaults() {
        let issuer = issuer();
        let now = Utc::now();

        let access = decode(&issuer, &issuer.issue("alice", TokenType::Access, now, None).unwrap());
        assert_eq!(access.exp.unwrap() - access.iat.unwrap(), 30 * 60);

        let refresh =
            decode(&issuer, &issuer.issue("alice", TokenType::Refresh, now, None).unwrap());
        assert_eq!(refresh.exp.unwrap() - refresh.iat.unwrap(), 7 * 24 * 60 * 60);
    }

    #[test]
    fn explicit_ttl_override_wins() {
        let issuer = issuer();
        let token = issuer
            .issue("alice", TokenType::Access, Utc::now(), Some(Duration::minutes(5)))
            .unwrap();
        let raw = decode(&issuer, &token);
        assert_eq!(raw.exp.unwrap() - raw.iat.unwrap(), 5 * 60);
    }

    #[test]
    fn pair_carries_both_types() {
        let issuer = issuer();
        let pair = issuer.issue_pair("alice", Utc::now()).unwrap();

        assert_eq!(
            decode(&issuer, &pair.access).token_type.as_deref(),
            Some("access")
        );
        assert_eq!(
            decode(&issuer, &pair.refresh).token_type.as_deref(),
            Some("refresh")
        );
    }

    #[test]
    fn issuance_stamps_iat_equal_to_nbf() {
        let issuer = issuer();
        let raw = decode(
            &issuer,
            &issuer.issue("bob", TokenType::Access, Utc::now(), None).unwrap(),
        );
        assert_eq!(raw.iat, raw.nbf);
        assert!(raw.jti.unwrap().starts_with("access_"));
    }
}
