//! Rate limiting port.

use std::time::Duration;

/// Rate limiter trait - abstraction over admission control backends.
///
/// Implementations are called once per inbound request, before any other
/// processing, so they must be cheap and must never block on I/O.
pub trait RateLimiter: Send + Sync {
    /// Check if a request from `client_id` is allowed and charge it if so.
    fn check(&self, client_id: &str) -> RateLimitResult;

    /// Shorthand for `check(client_id).allowed`.
    fn allow(&self, client_id: &str) -> bool {
        self.check(client_id).allowed
    }

    /// Maximum number of requests admitted per window.
    fn limit(&self) -> u32;
}

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Admissions still available to this client right now.
    pub remaining: u32,
    /// Time until the oldest counted request leaves the window.
    pub reset_after: Duration,
}

/// Rate limit errors.
///
/// Only configuration can fail; a rejected request is a regular
/// [`RateLimitResult`], never an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    #[error("Rate limit must allow at least one request per window")]
    ZeroLimit,

    #[error("Rate limit window must be longer than zero")]
    ZeroWindow,
}
