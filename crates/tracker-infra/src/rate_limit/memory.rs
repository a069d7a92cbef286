//! In-memory sliding window rate limiter keyed by client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use tracker_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

use super::window::ClientWindow;

/// In-memory rate limiter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    pub fn validate(&self) -> Result<(), RateLimitError> {
        if self.max_requests == 0 {
            return Err(RateLimitError::ZeroLimit);
        }
        if self.window.is_zero() {
            return Err(RateLimitError::ZeroWindow);
        }
        Ok(())
    }
}

/// Per-client sliding window rate limiter.
///
/// Each client id gets its own [`ClientWindow`], created on first sight.
/// The registry and the windows are locked independently: the registry lock
/// is released before a window is asked for its decision, so clients never
/// wait on each other.
///
/// Note: limits are per-process, not shared across instances.
pub struct SlidingWindowRateLimiter {
    clients: DashMap<String, Arc<ClientWindow>>,
    config: RateLimitConfig,
}

impl SlidingWindowRateLimiter {
    pub fn new(config: RateLimitConfig) -> Result<Self, RateLimitError> {
        config.validate()?;

        tracing::info!(
            max_requests = config.max_requests,
            window_secs = config.window.as_secs_f64(),
            "Sliding window rate limiter initialized"
        );

        Ok(Self {
            clients: DashMap::new(),
            config,
        })
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Number of clients that currently own a window.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Remove the windows of clients that have nothing counted and have not
    /// been seen for `idle_after` (never less than one window).
    ///
    /// Returns the number of evicted clients.
    pub fn evict_idle(&self, idle_after: Duration) -> usize {
        self.evict_idle_at(Instant::now(), idle_after)
    }

    pub(crate) fn evict_idle_at(&self, now: Instant, idle_after: Duration) -> usize {
        let idle_after = idle_after.max(self.config.window);
        let mut evicted = 0;

        // The window is retired while its shard is still locked, so nobody can
        // resolve it again once it has been dropped from the map.
        self.clients.retain(|_, window| {
            if window.retire_if_idle(now, idle_after) {
                evicted += 1;
                false
            } else {
                true
            }
        });

        if evicted > 0 {
            tracing::debug!(
                evicted,
                remaining = self.clients.len(),
                "Evicted idle rate limit windows"
            );
        }

        evicted
    }

    /// Resolve the window for `client_id`, creating it on first sight.
    fn window_for(&self, client_id: &str) -> Arc<ClientWindow> {
        if let Some(window) = self.clients.get(client_id) {
            return Arc::clone(window.value());
        }

        // `entry` holds the shard write lock, so concurrent first requests
        // for the same client all end up with the same window.
        let window = self
            .clients
            .entry(client_id.to_owned())
            .or_insert_with(|| {
                tracing::trace!(client_id, "Tracking new rate limit client");
                Arc::new(ClientWindow::new(
                    self.config.max_requests,
                    self.config.window,
                ))
            });

        Arc::clone(window.value())
    }
}

impl RateLimiter for SlidingWindowRateLimiter {
    fn check(&self, client_id: &str) -> RateLimitResult {
        loop {
            let window = self.window_for(client_id);
            if let Some(result) = window.try_check() {
                return result;
            }
            // Evicted between lookup and decision; the next lookup creates a
            // fresh window.
        }
    }

    fn limit(&self) -> u32 {
        self.config.max_requests
    }
}
