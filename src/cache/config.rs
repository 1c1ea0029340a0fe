use crate::time::Time;

#[derive(Debug, Clone)]
pub struct Config {
    /// How long an entry is served as fresh.
    pub ttl: Time,
    /// How long an entry is kept past `ttl` to serve as a fallback when refreshing fails.
    pub stale_retention: Time,
    /// Upper bound on every call to the backing store.
    pub timeout: Time,
    pub prefix: String,
}

impl Config {
    pub fn new(ttl: Time) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }

    pub fn with_stale_retention(mut self, retention: Time) -> Self {
        self.stale_retention = retention;
        self
    }

    pub fn with_timeout(mut self, timeout: Time) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Lifetime of an entry in the backing store.
    pub fn retention(&self) -> Time {
        Time::seconds(
            self.ttl
                .convert(crate::time::TimeUnit::Seconds)
                .amount
                .saturating_add(
                    self.stale_retention
                        .convert(crate::time::TimeUnit::Seconds)
                        .amount,
                ),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl: Time::hours(24),
            stale_retention: Time::new(7, crate::time::TimeUnit::Days),
            timeout: Time::seconds(2),
            prefix: "fx-gateway:rates".to_string(),
        }
    }
}
