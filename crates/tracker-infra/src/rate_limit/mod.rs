//! Rate limiting implementations.

mod memory;
mod window;

pub use memory::{RateLimitConfig, SlidingWindowRateLimiter};
pub use window::ClientWindow;
