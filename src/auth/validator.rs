use chrono::{DateTime, Utc};

use super::claims::{Claims, RawClaims, TokenType, AUDIENCE, ISSUER};
use super::codec::ClaimCodec;
use super::error::AuthError;

/// Tolerance for clock drift between issuer and validator when checking
/// issued-at. Tokens stamped further in the future than this are rejected.
pub const CLOCK_SKEW_SECS: i64 = 60;

/// Decodes and exhaustively validates a token against an expected type.
///
/// Checks run in a fixed order and the first failure wins: signature, claim
/// presence, token type, issuer/audience, expiry, not-before, future
/// issued-at. Signature failures therefore never leak anything about the
/// claims, and a malformed token is never misreported as merely expired.
#[derive(Clone)]
pub struct TokenValidator {
    codec: ClaimCodec,
}

impl TokenValidator {
    pub fn new(codec: ClaimCodec) -> Self {
        Self { codec }
    }

    /// Validate against the current wall clock.
    pub fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        self.validate_at(token, expected, Utc::now())
    }

    /// Validate as of an explicit instant.
    pub fn validate_at(
        &self,
        token: &str,
        expected: TokenType,
        now: DateTime<Utc>,
    ) -> Result<Claims, AuthError> {
        let raw = self.codec.decode(token, true)?;

        let missing = raw.missing_claims();
        let RawClaims {
            sub: Some(sub),
            exp: Some(exp),
            iat: Some(iat),
            nbf: Some(nbf),
            iss: Some(iss),
            aud: Some(aud),
            token_type: Some(token_type),
            jti: Some(jti),
        } = raw
        else {
            return Err(AuthError::MissingClaims(missing));
        };

        if token_type != expected.as_str() {
            return Err(AuthError::TokenTypeMismatch {
                expected: expected.as_str().to_string(),
                actual: token_type,
            });
        }
        if iss != ISSUER {
            return Err(AuthError::IssuerMismatch(iss));
        }
        if aud != AUDIENCE {
            return Err(AuthError::AudienceMismatch(aud));
        }

        let now = now.timestamp();
        if now >= exp {
            return Err(AuthError::Expired);
        }
        if now < nbf {
            return Err(AuthError::NotYetValid);
        }
        if iat > now + CLOCK_SKEW_SECS {
            return Err(AuthError::IssuedInFuture);
        }

        Ok(Claims {
            sub,
            exp,
            iat,
            nbf,
            iss,
            aud,
            token_type: expected,
            jti,
        })
    }
}
