use super::Datastore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bb8_redis::{
    bb8::Pool,
    redis::{self, AsyncCommands},
    RedisConnectionManager,
};
use essentials::debug;

pub struct RedisDatastore {
    pool: Pool<RedisConnectionManager>,
}

impl RedisDatastore {
    pub fn new(pool: Pool<RedisConnectionManager>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Datastore for RedisDatastore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.pool.get().await.with_context(|| {
            format!("Failed to get connection from Redis pool for key: {}", key)
        })?;
        let value: Option<String> = conn
            .get(key)
            .await
            .with_context(|| format!("Failed to fetch cache for key: {}", key))?;
        debug!(key, hit = value.is_some(), "Fetched cache");
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, expires_in: u64) -> Result<()> {
        debug!(key, expires_in, "Saving cache");
        let mut conn = self.pool.get().await.with_context(|| {
            format!("Failed to get connection from Redis pool for key: {}", key)
        })?;
        redis::pipe()
            .atomic()
            .set_ex(key, value, expires_in.max(1))
            .ignore()
            .query_async(&mut *conn)
            .await
            .map(|_: ()| ())
            .with_context(|| format!("Failed to save cache for key: {}", key))
    }
}
