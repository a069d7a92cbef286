//! Per-client request history.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use tracker_core::ports::RateLimitResult;

/// Timestamps of the requests admitted for a single client within the
/// trailing window.
///
/// Every decision runs the whole prune/check/append sequence under one
/// mutex, so concurrent callers for the same client are serialized and
/// always see a consistent history.
pub struct ClientWindow {
    limit: u32,
    window: Duration,
    state: Mutex<WindowState>,
}

struct WindowState {
    /// Admission instants, oldest first.
    requests: VecDeque<Instant>,
    /// Last time anyone asked this window for a decision.
    last_seen: Instant,
    /// Set once the window has been evicted from its registry.
    retired: bool,
}

impl ClientWindow {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self::starting_at(limit, window, Instant::now())
    }

    pub(crate) fn starting_at(limit: u32, window: Duration, now: Instant) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(WindowState {
                requests: VecDeque::new(),
                last_seen: now,
                retired: false,
            }),
        }
    }

    /// Admit one more request right now if the client is under its limit.
    pub fn allow(&self) -> bool {
        self.check().allowed
    }

    /// Same as [`allow`](Self::allow), with remaining quota and reset time.
    pub fn check(&self) -> RateLimitResult {
        let mut state = self.state.lock();
        self.decide(&mut state, Instant::now())
    }

    /// Decide at an explicit instant. Instants earlier than the newest
    /// recorded request are treated as that request's instant.
    pub fn check_at(&self, now: Instant) -> RateLimitResult {
        let mut state = self.state.lock();
        self.decide(&mut state, now)
    }

    /// Like [`check`](Self::check) but refuses to decide once the window has
    /// been retired, so the caller can look the client up again.
    pub(crate) fn try_check(&self) -> Option<RateLimitResult> {
        let mut state = self.state.lock();
        if state.retired {
            return None;
        }
        Some(self.decide(&mut state, Instant::now()))
    }

    #[cfg(test)]
    pub(crate) fn try_check_at(&self, now: Instant) -> Option<RateLimitResult> {
        let mut state = self.state.lock();
        if state.retired {
            return None;
        }
        Some(self.decide(&mut state, now))
    }

    /// Number of requests currently charged against the window.
    pub fn in_flight(&self) -> usize {
        let mut state = self.state.lock();
        self.prune(&mut state, Instant::now());
        state.requests.len()
    }

    /// Mark the window retired if nothing is counted and it has not been
    /// touched for `idle_after`. Returns whether the window is retired.
    pub(crate) fn retire_if_idle(&self, now: Instant, idle_after: Duration) -> bool {
        let mut state = self.state.lock();
        if state.retired {
            return true;
        }

        self.prune(&mut state, now);
        if state.requests.is_empty() && now.saturating_duration_since(state.last_seen) >= idle_after
        {
            state.retired = true;
        }
        state.retired
    }

    fn decide(&self, state: &mut WindowState, now: Instant) -> RateLimitResult {
        // Keep the history ordered even if the caller's clock reading is stale.
        let now = state.requests.back().map_or(now, |&newest| now.max(newest));
        state.last_seen = state.last_seen.max(now);

        self.prune(state, now);

        let counted = state.requests.len();
        if counted >= self.limit as usize {
            return RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_after: self.reset_after(state, now),
            };
        }

        state.requests.push_back(now);

        RateLimitResult {
            allowed: true,
            remaining: self.limit - state.requests.len() as u32,
            reset_after: self.reset_after(state, now),
        }
    }

    /// Drop every request at or before `now - window`.
    fn prune(&self, state: &mut WindowState, now: Instant) {
        // Nothing can be older than the window this early in the process.
        let Some(cutoff) = now.checked_sub(self.window) else {
            return;
        };

        while state
            .requests
            .front()
            .is_some_and(|&oldest| oldest <= cutoff)
        {
            state.requests.pop_front();
        }
    }

    fn reset_after(&self, state: &WindowState, now: Instant) -> Duration {
        state
            .requests
            .front()
            .map(|&oldest| {
                oldest
                    .checked_add(self.window)
                    .map_or(Duration::MAX, |end| end.saturating_duration_since(now))
            })
            .unwrap_or(Duration::ZERO)
    }
}
