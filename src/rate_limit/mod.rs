//! Sliding-window admission control backed by a shared counter store.
//!
//! Each key keeps one counter per fixed window. A request is judged against the
//! current window's count plus the previous window's count weighted by how much of
//! the previous window still overlaps the sliding interval, which avoids admitting
//! a double burst at a window boundary.

pub mod config;
pub mod datastore;

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use essentials::{debug, warn};

pub use config::{Config, FailurePolicy, Quota};
pub use datastore::{Datastore, InMemoryDatastore, WindowCounts};
#[cfg(feature = "redis")]
pub use datastore::RedisDatastore;

pub type SharedDatastore = Arc<dyn Datastore + Send + Sync + 'static>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

/// Weighs the two window counters at `elapsed` milliseconds into the current window.
pub fn decide(
    quota: &Quota,
    counts: WindowCounts,
    window_start: DateTime<Utc>,
    elapsed: u64,
) -> RateLimitDecision {
    let window_millis = quota.window.as_millis().max(1);
    let overlap = 1.0 - (elapsed.min(window_millis) as f64 / window_millis as f64);
    let weighted = counts.previous as f64 * overlap + counts.current as f64;
    let used = weighted.ceil() as u64;
    RateLimitDecision {
        allowed: weighted <= quota.requests as f64,
        limit: quota.requests,
        remaining: quota.requests.saturating_sub(used),
        reset_at: shift(window_start, quota.window.as_delta()),
    }
}

fn shift(instant: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    instant
        .checked_add_signed(by)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub struct RateLimiter {
    config: Config,
    datastore: SharedDatastore,
}

impl RateLimiter {
    pub fn new(config: Config, datastore: impl Datastore + Send + Sync + 'static) -> Self {
        Self::shared(config, Arc::new(datastore))
    }

    pub fn shared(config: Config, datastore: SharedDatastore) -> Self {
        Self { config, datastore }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Counts a request for `key` and decides whether it is admitted.
    pub async fn check_limit(&self, key: &str) -> RateLimitDecision {
        self.check_limit_at(key, Utc::now()).await
    }

    pub async fn check_limit_at(&self, key: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let quota = &self.config.quota;
        let window_millis = quota.window.as_millis().max(1);
        let now_millis = now.timestamp_millis().max(0) as u64;
        let window = now_millis / window_millis;
        let window_start = Utc
            .timestamp_millis_opt((window * window_millis) as i64)
            .single()
            .unwrap_or(now);
        let key = format!("{}:{}", self.config.prefix, key);
        let counts = tokio::time::timeout(
            self.config.timeout.as_duration(),
            self.datastore.increment(&key, window, window_millis),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Timed out after {}", self.config.timeout))
        .and_then(|result| result);
        match counts {
            Ok(counts) => {
                let elapsed = now_millis - window * window_millis;
                let decision = decide(quota, counts, window_start, elapsed);
                debug!(
                    key = %key,
                    previous = counts.previous,
                    current = counts.current,
                    allowed = decision.allowed,
                    remaining = decision.remaining,
                    "Rate limit checked"
                );
                decision
            }
            Err(error) => {
                warn!(
                    key = %key,
                    policy = %self.config.failure_policy,
                    "Rate limit backend unavailable: {:#}", error
                );
                self.on_backend_failure(now)
            }
        }
    }

    fn on_backend_failure(&self, now: DateTime<Utc>) -> RateLimitDecision {
        let quota = &self.config.quota;
        let reset_at = shift(now, quota.window.as_delta());
        match self.config.failure_policy {
            FailurePolicy::Open => RateLimitDecision {
                allowed: true,
                limit: quota.requests,
                remaining: quota.requests,
                reset_at,
            },
            FailurePolicy::Closed => RateLimitDecision {
                allowed: false,
                limit: quota.requests,
                remaining: 0,
                reset_at,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Time;
    use async_trait::async_trait;

    struct FailingDatastore;

    #[async_trait]
    impl Datastore for FailingDatastore {
        async fn increment(&self, _: &str, _: u64, _: u64) -> anyhow::Result<WindowCounts> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    struct HangingDatastore;

    #[async_trait]
    impl Datastore for HangingDatastore {
        async fn increment(&self, _: &str, _: u64, _: u64) -> anyhow::Result<WindowCounts> {
            futures::future::pending().await
        }
    }

    fn quota() -> Quota {
        Quota::new(10, Time::seconds(10))
    }

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_decide_weights_previous_window() {
        let start = at(0);
        let counts = WindowCounts {
            previous: 10,
            current: 1,
        };
        // Half of the previous window still overlaps: 10 * 0.5 + 1 = 6.
        let decision = decide(&quota(), counts, start, 5_000);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
        assert_eq!(decision.reset_at, at(10_000));
        // Right after the boundary the previous window still counts fully.
        let decision = decide(&quota(), counts, start, 0);
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn test_decide_at_limit() {
        let counts = WindowCounts {
            previous: 0,
            current: 10,
        };
        let decision = decide(&quota(), counts, at(0), 9_000);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 0);
        let counts = WindowCounts {
            previous: 0,
            current: 11,
        };
        assert!(!decide(&quota(), counts, at(0), 9_000).allowed);
    }

    #[tokio::test]
    async fn test_limiter_denies_after_quota() {
        let limiter = RateLimiter::new(
            Config::new(Quota::new(2, Time::seconds(60)), FailurePolicy::Closed),
            InMemoryDatastore::new(),
        );
        let now = at(1_000);
        let first = limiter.check_limit_at("user", now).await;
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);
        assert!(limiter.check_limit_at("user", now).await.allowed);
        let third = limiter.check_limit_at("user", now).await;
        assert!(!third.allowed);
        assert_eq!(third.reset_at, at(60_000));
        assert!(limiter.check_limit_at("other", now).await.allowed);
    }

    #[tokio::test]
    async fn test_limiter_slides_into_next_window() {
        let limiter = RateLimiter::new(
            Config::new(Quota::new(2, Time::seconds(10)), FailurePolicy::Closed),
            InMemoryDatastore::new(),
        );
        limiter.check_limit_at("user", at(9_000)).await;
        limiter.check_limit_at("user", at(9_500)).await;
        // 2 * 0.9 + 1 = 2.8 > 2
        assert!(!limiter.check_limit_at("user", at(11_000)).await.allowed);
        // 2 * 0.1 + 2 = 2.2 > 2, still denied; denied calls are counted too
        assert!(!limiter.check_limit_at("user", at(19_000)).await.allowed);
        assert!(limiter.check_limit_at("user", at(30_000)).await.allowed);
    }

    #[tokio::test]
    async fn test_oversized_window_saturates_reset() {
        let quota = Quota::new(1, Time::seconds(u64::MAX));
        let limiter = RateLimiter::new(
            Config::new(quota, FailurePolicy::Closed),
            InMemoryDatastore::new(),
        );
        let decision = limiter.check_limit_at("user", at(1_000)).await;
        assert!(decision.allowed);
        assert_eq!(decision.reset_at, DateTime::<Utc>::MAX_UTC);
        let limiter = RateLimiter::new(Config::new(quota, FailurePolicy::Open), FailingDatastore);
        assert_eq!(
            limiter.check_limit("user").await.reset_at,
            DateTime::<Utc>::MAX_UTC
        );
    }

    #[tokio::test]
    async fn test_backend_failure_open() {
        let limiter = RateLimiter::new(
            Config::new(quota(), FailurePolicy::Open),
            FailingDatastore,
        );
        let decision = limiter.check_limit("user").await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 10);
    }

    #[tokio::test]
    async fn test_backend_failure_closed() {
        let limiter = RateLimiter::new(
            Config::new(quota(), FailurePolicy::Closed),
            FailingDatastore,
        );
        let decision = limiter.check_limit("user").await;
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[tokio::test]
    async fn test_backend_timeout_uses_policy() {
        let limiter = RateLimiter::new(
            Config::new(quota(), FailurePolicy::Closed)
                .with_timeout(Time::new(20, crate::time::TimeUnit::Milliseconds)),
            HangingDatastore,
        );
        assert!(!limiter.check_limit("user").await.allowed);
    }
}
