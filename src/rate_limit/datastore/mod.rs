use anyhow::Result;
use async_trait::async_trait;

mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use memory::InMemoryDatastore;
#[cfg(feature = "redis")]
pub use redis::RedisDatastore;

/// Request counters for the window a hit landed in and the one before it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct WindowCounts {
    pub previous: u64,
    pub current: u64,
}

#[async_trait]
pub trait Datastore {
    /// Count one request against `key` in window number `window` and return both counters.
    /// `window_millis` is the window length, used to expire counters.
    async fn increment(&self, key: &str, window: u64, window_millis: u64) -> Result<WindowCounts>;
}
