use axum::{
    extract::{Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::auth::AuthenticatedPrincipal;
use crate::error::ApiError;
use crate::state::AppState;

/// Authentication middleware guarding the protected API surface.
///
/// Runs the gate against the request headers and injects the authenticated
/// principal into request extensions. Every gate failure surfaces as the
/// same generic 401; the specific reason is only logged.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = state.auth.authenticate(request.headers()).await?;

    tracing::debug!(
        username = %principal.principal.username,
        role = principal.principal.role_name().unwrap_or("-"),
        "request authenticated"
    );

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Extractor for the principal injected by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedPrincipal);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedPrincipal>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::unauthorized("Could not validate credentials"))
    }
}
