//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracker_core::RateLimitError;
use tracker_infra::RateLimitConfig;

/// Configuration errors. The server refuses to start on any of these.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("Invalid rate limit configuration: {0}")]
    RateLimit(#[from] RateLimitError),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub rate_limit: RateLimitConfig,
    pub sweep: SweepConfig,
}

/// Idle client eviction schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Time between sweeps. Zero disables sweeping.
    pub interval: Duration,
    /// How many windows a client must stay idle before it is forgotten.
    pub idle_windows: u32,
}

impl SweepConfig {
    pub fn enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    /// Idle time after which a client with an empty window is evicted.
    pub fn idle_after(&self, window: Duration) -> Duration {
        window.checked_mul(self.idle_windows).unwrap_or(Duration::MAX)
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let rate_limit = RateLimitConfig::new(
            parse_or(&lookup, "RATE_LIMIT_MAX_REQUESTS", 100)?,
            Duration::from_secs(parse_or(&lookup, "RATE_LIMIT_WINDOW_SECS", 60)?),
        );
        rate_limit.validate()?;

        let sweep = SweepConfig {
            interval: Duration::from_secs(parse_or(&lookup, "RATE_LIMIT_SWEEP_INTERVAL_SECS", 60)?),
            idle_windows: parse_or(&lookup, "RATE_LIMIT_IDLE_WINDOWS", 2)?,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            rate_limit,
            sweep,
        })
    }
}

/// Parse `key` if set and non-empty, otherwise fall back to `default`.
fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert_eq!(config.sweep.interval, Duration::from_secs(60));
        assert_eq!(config.sweep.idle_windows, 2);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("RATE_LIMIT_MAX_REQUESTS", "3"),
            ("RATE_LIMIT_WINDOW_SECS", " 1 "),
            ("RATE_LIMIT_SWEEP_INTERVAL_SECS", "0"),
        ])
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.rate_limit.max_requests, 3);
        assert_eq!(config.rate_limit.window, Duration::from_secs(1));
        assert!(!config.sweep.enabled());
    }

    #[test]
    fn test_empty_value_uses_default() {
        let config = load(&[("RATE_LIMIT_MAX_REQUESTS", "")]).unwrap();
        assert_eq!(config.rate_limit.max_requests, 100);
    }

    #[test]
    fn test_malformed_value_is_rejected() {
        let err = load(&[("RATE_LIMIT_MAX_REQUESTS", "-5")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "RATE_LIMIT_MAX_REQUESTS", .. }
        ));
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let err = load(&[("RATE_LIMIT_MAX_REQUESTS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::RateLimit(RateLimitError::ZeroLimit)));
    }

    #[test]
    fn test_zero_window_is_rejected() {
        let err = load(&[("RATE_LIMIT_WINDOW_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::RateLimit(RateLimitError::ZeroWindow)));
    }

    #[test]
    fn test_idle_after_scales_with_window() {
        let sweep = SweepConfig {
            interval: Duration::from_secs(60),
            idle_windows: 3,
        };
        assert_eq!(sweep.idle_after(Duration::from_secs(60)), Duration::from_secs(180));

        let huge = SweepConfig {
            interval: Duration::from_secs(60),
            idle_windows: u32::MAX,
        };
        assert_eq!(huge.idle_after(Duration::MAX), Duration::MAX);
    }
}
