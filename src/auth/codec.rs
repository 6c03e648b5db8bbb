use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use super::claims::RawClaims;
use super::error::AuthError;

/// Serializes claim sets into signed HS256 tokens and back. Pure and
/// stateless beyond the shared secret; all claim-level validation lives in
/// the token validator.
#[derive(Clone)]
pub struct ClaimCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl ClaimCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Sign any serializable claim set into a compact token string.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    /// Decode a token back into its raw claim set.
    ///
    /// With `verify_signature` the signature must match the shared secret;
    /// without it the payload is read as-is (inspection only, never for
    /// authentication). Claim checks are intentionally disabled here so the
    /// validator controls their order and error kinds.
    pub fn decode(&self, token: &str, verify_signature: bool) -> Result<RawClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        if !verify_signature {
            validation.insecure_disable_signature_validation();
        }

        match decode::<RawClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => Err(AuthError::Signature),
                _ => Err(AuthError::Malformed(e.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::{Claims, TokenType};
    use chrono::{Duration, Utc};

    fn codec() -> ClaimCodec {
        ClaimCodec::new("test-secret-for-unit-tests-minimum-32-chars-long")
    }

    #[test]
    fn encode_decode_round_trip() {
        let claims = Claims::issue("alice", TokenType::Access, Utc::now(), Duration::minutes(30));
        let token = codec().encode(&claims).unwrap();

        let raw = codec().decode(&token, true).unwrap();
        assert_eq!(raw.sub.as_deref(), Some("alice"));
        assert_eq!(raw.exp, Some(claims.exp));
        assert_eq!(raw.iat, Some(claims.iat));
        assert_eq!(raw.nbf, Some(claims.nbf));
        assert_eq!(raw.token_type.as_deref(), Some("access"));
        assert_eq!(raw.jti.as_deref(), Some(claims.jti.as_str()));
        assert!(raw.missing_claims().is_empty());
    }

    #[test]
    fn tampered_signature_is_a_signature_error() {
        let claims = Claims::issue("alice", TokenType::Access, Utc::now(), Duration::minutes(30));
        let token = codec().encode(&claims).unwrap();

        // Flip a character in the signature segment.
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let sig = parts[2].clone();
        let flipped = if sig.starts_with('A') { "B" } else { "A" };
        parts[2] = format!("{}{}", flipped, &sig[1..]);
        let tampered = parts.join(".");

        assert!(matches!(
            codec().decode(&tampered, true),
            Err(AuthError::Signature)
        ));
    }

    #[test]
    fn wrong_secret_is_a_signature_error() {
        let claims = Claims::issue("alice", TokenType::Access, Utc::now(), Duration::minutes(30));
        let token = codec().encode(&claims).unwrap();

        let other = ClaimCodec::new("a-completely-different-secret-value-here");
        assert!(matches!(other.decode(&token, true), Err(AuthError::Signature)));
    }

    #[test]
    fn garbage_is_malformed_not_signature() {
        assert!(matches!(
            codec().decode("not-a-token", true),
            Err(AuthError::Malformed(_))
        ));
        assert!(matches!(
            codec().decode("a.b.c", true),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn unverified_decode_ignores_the_signature() {
        let claims = Claims::issue("alice", TokenType::Access, Utc::now(), Duration::minutes(30));
        let token = codec().encode(&claims).unwrap();

        let other = ClaimCodec::new("a-completely-different-secret-value-here");
        let raw = other.decode(&token, false).unwrap();
        assert_eq!(raw.sub.as_deref(), Some("alice"));
    }
}
