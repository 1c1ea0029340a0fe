use anyhow::Result;
use async_trait::async_trait;

pub use memory::InMemoryDatastore;
#[cfg(feature = "redis")]
pub use redis::RedisDatastore;

mod memory;
#[cfg(feature = "redis")]
mod redis;

/// Key-value store with per-entry expiry. Writes overwrite; last writer wins.
#[async_trait]
pub trait Datastore {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String, expires_in: u64) -> Result<()>;
}
