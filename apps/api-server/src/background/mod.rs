//! Background maintenance jobs.

mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::JobSchedulerError;
use tracker_infra::SlidingWindowRateLimiter;

use crate::config::SweepConfig;

pub use scheduler::Scheduler;

/// Start the periodic eviction of idle rate limit clients.
///
/// Returns `None` when sweeping is disabled.
pub async fn start_idle_sweep(
    limiter: Arc<SlidingWindowRateLimiter>,
    sweep: SweepConfig,
) -> Result<Option<Scheduler>, JobSchedulerError> {
    if !sweep.enabled() {
        tracing::info!("Idle client sweep disabled");
        return Ok(None);
    }

    let idle_after = sweep.idle_after(limiter.config().window);
    let scheduler = Scheduler::new().await?;
    scheduler
        .add_repeated(sweep.interval, move || {
            let limiter = Arc::clone(&limiter);
            async move {
                sweep_idle_clients(&limiter, idle_after);
            }
        })
        .await?;
    scheduler.start().await?;

    tracing::info!(
        interval_secs = sweep.interval.as_secs(),
        idle_after_secs = idle_after.as_secs(),
        "Idle client sweep scheduled"
    );

    Ok(Some(scheduler))
}

/// One sweep pass. Returns the number of evicted clients.
pub fn sweep_idle_clients(limiter: &SlidingWindowRateLimiter, idle_after: Duration) -> usize {
    let evicted = limiter.evict_idle(idle_after);
    tracing::trace!(
        evicted,
        tracked = limiter.tracked_clients(),
        "Idle client sweep finished"
    );
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::RateLimiter;
    use tracker_infra::RateLimitConfig;

    fn limiter(window: Duration) -> Arc<SlidingWindowRateLimiter> {
        Arc::new(SlidingWindowRateLimiter::new(RateLimitConfig::new(5, window)).unwrap())
    }

    #[tokio::test]
    async fn test_disabled_sweep_starts_nothing() {
        let sweep = SweepConfig {
            interval: Duration::ZERO,
            idle_windows: 2,
        };
        let scheduler = start_idle_sweep(limiter(Duration::from_secs(1)), sweep)
            .await
            .unwrap();
        assert!(scheduler.is_none());
    }

    #[test]
    fn test_sweep_keeps_active_clients() {
        let limiter = limiter(Duration::from_secs(60));
        assert!(limiter.allow("active"));

        assert_eq!(sweep_idle_clients(&limiter, Duration::ZERO), 0);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_sweep_evicts_clients_after_idle_period() {
        let limiter = limiter(Duration::from_millis(50));
        assert!(limiter.allow("transient-1"));
        assert!(limiter.allow("transient-2"));

        std::thread::sleep(Duration::from_millis(150));
        assert!(limiter.allow("fresh"));

        assert_eq!(sweep_idle_clients(&limiter, Duration::from_millis(100)), 2);
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
