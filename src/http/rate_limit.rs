//! Rate limiting implementation
//!
//! Uses the governor crate for token bucket pacing between page requests.

use crate::pagination::{FixedPause, NoPause, Pacer};
use crate::types::{try_parse_float, JsonObject, JsonValue};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Pacing settings for an API source
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RateLimitConfig {
    /// Fixed delay between requests, in seconds
    pub sleep_seconds: Option<f64>,
    /// Maximum requests per second
    pub max_per_sec: Option<f64>,
}

impl RateLimitConfig {
    /// Fixed sleep between requests
    pub fn sleep(seconds: f64) -> Self {
        Self {
            sleep_seconds: Some(seconds),
            max_per_sec: None,
        }
    }

    /// Cap on requests per second
    pub fn per_second(rate: f64) -> Self {
        Self {
            sleep_seconds: None,
            max_per_sec: Some(rate),
        }
    }

    /// Parse a raw mapping; `None` when `obj` is not a mapping.
    ///
    /// Values that do not parse as numbers are left unset.
    pub fn from_mapping(obj: &JsonValue) -> Option<Self> {
        obj.as_object().map(Self::from_object)
    }

    /// Parse a JSON object; see [`RateLimitConfig::from_mapping`]
    pub fn from_object(obj: &JsonObject) -> Self {
        let float = |key: &str| obj.get(key).and_then(try_parse_float);
        Self {
            sleep_seconds: float("sleep_seconds"),
            max_per_sec: float("max_per_sec"),
        }
    }

    /// Overlay `overrides` on top of this config; set fields win
    #[must_use]
    pub fn merged(self, overrides: &Self) -> Self {
        Self {
            sleep_seconds: overrides.sleep_seconds.or(self.sleep_seconds),
            max_per_sec: overrides.max_per_sec.or(self.max_per_sec),
        }
    }

    /// Non-fatal warnings for out-of-range values
    pub fn validate_bounds(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.sleep_seconds.is_some_and(|s| s < 0.0) {
            warnings.push("sleep_seconds should be >= 0".to_string());
        }
        if self.max_per_sec.is_some_and(|r| r <= 0.0) {
            warnings.push("max_per_sec should be > 0".to_string());
        }
        warnings
    }

    /// Resolve the pause taken between requests.
    ///
    /// A positive `sleep_seconds` wins; otherwise a positive `max_per_sec`
    /// yields a token bucket; otherwise there is no pause.
    pub fn pacer(&self) -> Arc<dyn Pacer> {
        if let Some(seconds) = self.sleep_seconds.filter(|s| *s > 0.0 && s.is_finite()) {
            return Arc::new(FixedPause(Duration::from_secs_f64(seconds)));
        }
        match self
            .max_per_sec
            .filter(|r| *r > 0.0 && r.is_finite())
            .and_then(RateLimiter::per_second)
        {
            Some(limiter) => Arc::new(limiter),
            None => Arc::new(NoPause),
        }
    }
}

/// Token bucket rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RateLimiter {
    /// Create a limiter allowing `rate` requests per second with no burst.
    ///
    /// Returns `None` for rates too high or too low to express as a period.
    pub fn per_second(rate: f64) -> Option<Self> {
        let period = Duration::try_from_secs_f64(1.0 / rate).ok()?;
        let quota = Quota::with_period(period)?.allow_burst(NonZeroU32::MIN);
        let limiter = Governor::direct(quota);

        // The first request is never paced, so its cell is taken up front.
        let _ = limiter.check();

        Some(Self {
            limiter: Arc::new(limiter),
        })
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Try to acquire a permit, returning immediately
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

#[async_trait]
impl Pacer for RateLimiter {
    async fn pause(&self) {
        self.wait().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish()
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;
    use serde_json::json;
    use std::time::Instant;

    #[test]
    fn test_rate_limit_from_mapping() {
        let config =
            RateLimitConfig::from_mapping(&json!({"sleep_seconds": "0.5", "max_per_sec": 4}))
                .unwrap();
        assert_eq!(config.sleep_seconds, Some(0.5));
        assert_eq!(config.max_per_sec, Some(4.0));

        let config = RateLimitConfig::from_mapping(&json!({"max_per_sec": "fast"})).unwrap();
        assert_eq!(config.max_per_sec, None);

        assert!(RateLimitConfig::from_mapping(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_rate_limit_validate_bounds() {
        let config = RateLimitConfig {
            sleep_seconds: Some(-1.0),
            max_per_sec: Some(0.0),
        };
        assert_eq!(
            config.validate_bounds(),
            vec!["sleep_seconds should be >= 0", "max_per_sec should be > 0"]
        );
        assert!(RateLimitConfig::sleep(0.0).validate_bounds().is_empty());
    }

    #[test]
    fn test_rate_limit_merged() {
        let base = RateLimitConfig::per_second(2.0);
        let merged = base.merged(&RateLimitConfig::sleep(1.5));
        assert_eq!(merged.sleep_seconds, Some(1.5));
        assert_eq!(merged.max_per_sec, Some(2.0));
    }

    #[test]
    fn test_rate_limiter_rejects_zero_period() {
        assert!(RateLimiter::per_second(f64::INFINITY).is_none());
        assert!(RateLimiter::per_second(10.0).is_some());
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let limiter = RateLimiter::per_second(20.0).unwrap();
        assert!(!limiter.try_acquire());

        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_sleep_pacer_waits() {
        let pacer = RateLimitConfig::sleep(0.05).pacer();
        let start = Instant::now();
        pacer.pause().await;
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[tokio::test]
    async fn test_unset_pacer_does_not_wait() {
        let pacer = RateLimitConfig::default().pacer();
        let start = Instant::now();
        pacer.pause().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
