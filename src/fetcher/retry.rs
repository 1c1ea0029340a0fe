use std::{future::Future, time::Duration};

use essentials::warn;

use super::FetchError;

/// Bounded exponential backoff for upstream calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts including the first one; 1 disables retrying.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryConfig {
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }

    pub(crate) async fn run<F, Fut, T>(&self, operation: &str, f: F) -> Result<T, FetchError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(result) => return Ok(result),
                Err(error) if error.is_transient() && attempt + 1 < self.max_attempts => {
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        reason = %error.reason(),
                        "Retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_is_capped() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(400));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_retries_transient_errors_only() {
        let config = RetryConfig::default()
            .max_attempts(3)
            .initial_delay(Duration::from_millis(1));
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = config
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Timeout)
            })
            .await;
        assert!(matches!(result, Err(FetchError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let calls = AtomicU32::new(0);
        let result: Result<(), _> = config
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Parse("bad".into()))
            })
            .await;
        assert!(matches!(result, Err(FetchError::Parse(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
