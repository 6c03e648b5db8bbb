use bcrypt::{hash, verify, DEFAULT_COST};

use super::error::AuthError;

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    hash(password, DEFAULT_COST).map_err(|e| AuthError::Encoding(e.to_string()))
}

/// Verify a plaintext password against a stored hash. Any verification
/// failure, including an unparseable hash, counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    verify(password, password_hash).unwrap_or(false)
}
