pub mod config;
pub mod datastore;

use std::sync::Arc;

use anyhow::{Context, Result};
use essentials::{debug, warn};

use crate::{rates::CachedRates, time::TimeUnit, Currency};
pub use config::Config;
pub use datastore::{Datastore, InMemoryDatastore};
#[cfg(feature = "redis")]
pub use datastore::RedisDatastore;

pub type SharedDatastore = Arc<dyn Datastore + Send + Sync + 'static>;

/// Rate entries keyed by base currency, stored as JSON.
pub struct RatesCache {
    config: Config,
    datastore: SharedDatastore,
}

impl RatesCache {
    pub fn new(config: Config, datastore: impl Datastore + Send + Sync + 'static) -> Self {
        Self::shared(config, Arc::new(datastore))
    }

    pub fn shared(config: Config, datastore: SharedDatastore) -> Self {
        Self { config, datastore }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn key(&self, base: Currency) -> String {
        format!("{}:{}", self.config.prefix, base)
    }

    /// Returns the stored entry regardless of freshness; a corrupt value reads as absent.
    pub async fn get(&self, base: Currency) -> Result<Option<CachedRates>> {
        let key = self.key(base);
        let raw = tokio::time::timeout(self.config.timeout.as_duration(), self.datastore.get(&key))
            .await
            .with_context(|| format!("Timed out reading cache for key: {}", key))??;
        let raw = match raw {
            Some(raw) => raw,
            None => {
                debug!(key = %key, "Cache miss");
                return Ok(None);
            }
        };
        match serde_json::from_str::<CachedRates>(&raw) {
            Ok(entry) if entry.base == base => Ok(Some(entry)),
            Ok(entry) => {
                warn!(key = %key, stored = %entry.base, "Cached entry has a different base");
                Ok(None)
            }
            Err(error) => {
                warn!(key = %key, "Discarding unreadable cache entry: {}", error);
                Ok(None)
            }
        }
    }

    pub async fn set(&self, entry: &CachedRates) -> Result<()> {
        let key = self.key(entry.base);
        let value = serde_json::to_string(entry)
            .with_context(|| format!("Failed to serialize cache entry for key: {}", key))?;
        let expires_in = self.config.retention().convert(TimeUnit::Seconds).amount;
        tokio::time::timeout(
            self.config.timeout.as_duration(),
            self.datastore.set(&key, value, expires_in),
        )
        .await
        .with_context(|| format!("Timed out writing cache for key: {}", key))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::ExchangeRateData;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use std::collections::BTreeMap;

    fn entry(base: Currency) -> CachedRates {
        CachedRates::new(
            ExchangeRateData {
                base,
                date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
                rates: BTreeMap::from([("USD".to_string(), 1.08)]),
            },
            Utc::now(),
        )
    }

    struct RecordingDatastore {
        inner: InMemoryDatastore,
        writes: std::sync::Mutex<Vec<(String, u64)>>,
    }

    #[async_trait]
    impl Datastore for RecordingDatastore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String, expires_in: u64) -> Result<()> {
            self.writes.lock().unwrap().push((key.to_string(), expires_in));
            self.inner.set(key, value, expires_in).await
        }
    }

    #[tokio::test]
    async fn test_round_trip_and_retention() {
        let store = Arc::new(RecordingDatastore {
            inner: InMemoryDatastore::new(),
            writes: Default::default(),
        });
        let cache = RatesCache::shared(
            Config::new(crate::time::Time::hours(24))
                .with_stale_retention(crate::time::Time::hours(24)),
            store.clone(),
        );
        let entry = entry(Currency::Eur);
        cache.set(&entry).await.unwrap();
        assert_eq!(cache.get(Currency::Eur).await.unwrap(), Some(entry));
        assert_eq!(cache.get(Currency::Usd).await.unwrap(), None);
        assert_eq!(
            store.writes.lock().unwrap().as_slice(),
            &[("fx-gateway:rates:EUR".to_string(), 172_800)]
        );
    }

    #[tokio::test]
    async fn test_corrupt_entry_reads_as_absent() {
        let store = Arc::new(InMemoryDatastore::new());
        store
            .set("fx-gateway:rates:EUR", "{not json".to_string(), 60)
            .await
            .unwrap();
        let cache = RatesCache::shared(Config::default(), store);
        assert_eq!(cache.get(Currency::Eur).await.unwrap(), None);
    }
}
