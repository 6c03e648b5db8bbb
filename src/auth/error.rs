use thiserror::Error;

use crate::store::StoreError;

/// Every way a token or an authentication pass can fail. Handlers never show
/// these to clients: the HTTP edge collapses all of them into a generic 401
/// so the rejection reason is not leaked, while the kind itself is logged.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("token signature verification failed")]
    Signature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("missing required claims: {}", .0.join(", "))]
    MissingClaims(Vec<String>),

    #[error("invalid token type: expected {expected}, got {actual}")]
    TokenTypeMismatch { expected: String, actual: String },

    #[error("unexpected issuer: {0}")]
    IssuerMismatch(String),

    #[error("unexpected audience: {0}")]
    AudienceMismatch(String),

    #[error("token has expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("token issued in the future")]
    IssuedInFuture,

    #[error("missing authentication token")]
    MissingToken,

    #[error("principal not found: {0}")]
    PrincipalNotFound(String),

    #[error("inactive principal: {0}")]
    InactivePrincipal(String),

    #[error("token encoding failed: {0}")]
    Encoding(String),

    #[error("principal store error: {0}")]
    Store(#[from] StoreError),
}
