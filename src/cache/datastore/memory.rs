use super::Datastore;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

#[derive(Debug, Default)]
pub struct InMemoryDatastore {
    data: Arc<Mutex<HashMap<String, InMemoryValue>>>,
}

#[derive(Debug)]
struct InMemoryValue {
    value: String,
    expiry: i64,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| anyhow!("Failed to lock data for key: {}", key))?;
        let now = chrono::Utc::now().timestamp();
        match data.get(key) {
            Some(entry) if entry.expiry > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                data.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, expires_in: u64) -> Result<()> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| anyhow!("Failed to lock data for key: {}", key))?;
        data.insert(
            key.to_string(),
            InMemoryValue {
                value,
                expiry: chrono::Utc::now()
                    .timestamp()
                    .saturating_add(expires_in.min(i64::MAX as u64) as i64),
            },
        );
        Ok(())
    }
}
