pub mod auth;
pub mod response;
pub mod security_headers;

pub use auth::{auth_middleware, CurrentUser};
pub use response::{ApiResponse, ApiResult};
pub use security_headers::security_headers_middleware;
