//! # Tracker Core
//!
//! Port definitions shared by the health tracker backend.
//! This crate has zero infrastructure dependencies.

pub mod ports;

pub use ports::{RateLimitError, RateLimitResult, RateLimiter};
