//! Application state - shared across all handlers.

use std::sync::Arc;

use tracker_core::{RateLimitError, RateLimiter};
use tracker_infra::{RateLimitConfig, SlidingWindowRateLimiter};

/// Shared application state.
///
/// Holds the single rate limiter of the process; every worker gets a clone of
/// the same `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub rate_limiter: Arc<SlidingWindowRateLimiter>,
}

impl AppState {
    pub fn new(rate_limit: RateLimitConfig) -> Result<Self, RateLimitError> {
        let rate_limiter = Arc::new(SlidingWindowRateLimiter::new(rate_limit)?);

        tracing::info!("Application state initialized");

        Ok(Self { rate_limiter })
    }

    /// The limiter as seen by the HTTP boundary.
    pub fn limiter(&self) -> Arc<dyn RateLimiter> {
        self.rate_limiter.clone()
    }
}
