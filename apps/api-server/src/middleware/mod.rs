//! Middleware modules.

pub mod error;
pub mod rate_limit;
pub mod security;

pub use rate_limit::RateLimitMiddleware;
pub use security::security_headers;
