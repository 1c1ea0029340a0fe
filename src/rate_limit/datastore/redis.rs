use anyhow::{Context, Result};
use async_trait::async_trait;
use bb8_redis::{bb8::Pool, redis, RedisConnectionManager};

use super::{Datastore, WindowCounts};

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
    async fn increment(&self, key: &str, window: u64, window_millis: u64) -> Result<WindowCounts> {
        let mut conn = self.pool.get().await.with_context(|| {
            format!("Failed to get connection from Redis pool for key: {}", key)
        })?;
        let current_key = format!("{key}:{window}");
        let previous_key = format!("{key}:{}", window.saturating_sub(1));
        redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&current_key)
            .cmd("PEXPIRE")
            .arg(&current_key)
            .arg(window_millis.saturating_mul(2))
            .ignore()
            .cmd("GET")
            .arg(&previous_key)
            .query_async(&mut *conn)
            .await
            .map(|(current, previous): (u64, Option<u64>)| WindowCounts {
                previous: if window == 0 { 0 } else { previous.unwrap_or(0) },
                current,
            })
            .with_context(|| format!("Failed to count request for key: {}", key))
    }
}
