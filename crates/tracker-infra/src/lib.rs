//! # Tracker Infrastructure
//!
//! Concrete implementations of the ports defined in `tracker-core`.
//!
//! ## Feature Flags
//!
//! - `rate-limit` (default) - In-memory per-client sliding window rate limiting

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

#[cfg(feature = "rate-limit")]
pub use rate_limit::{ClientWindow, RateLimitConfig, SlidingWindowRateLimiter};
