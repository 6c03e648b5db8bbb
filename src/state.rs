use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::rate_limit::RateLimiter;
use crate::store::{PrincipalStore, UserStore};

/// Everything request handling needs, constructed once at startup and
/// injected through axum state. Keeps the auth engine, the user directory
/// and the rate limiter out of module-level globals so tests can assemble
/// their own around a fake store.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<dyn UserStore>,
    pub limiter: Arc<RateLimiter>,
    pub rate_limiting_enabled: bool,
}

impl AppState {
    pub fn new<S>(config: &AppConfig, users: Arc<S>) -> Self
    where
        S: UserStore + 'static,
    {
        let principal_store: Arc<dyn PrincipalStore> = users.clone();
        let auth = Arc::new(AuthService::new(&config.security, principal_store));
        let limiter = Arc::new(RateLimiter::new(
            config.api.rate_limit_requests,
            config.api.rate_limit_window_secs,
        ));
        Self {
            auth,
            users,
            limiter,
            rate_limiting_enabled: config.api.enable_rate_limiting,
        }
    }
}
