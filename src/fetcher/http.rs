use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use essentials::{debug, warn};
use reqwest::{Client, Url};
use serde::Deserialize;

use super::{FetchError, RatesFetcher, RetryConfig};
use crate::{
    rates::{ExchangeRateData, Rates},
    Currency,
};

pub const DEFAULT_URL: &str = "https://api.frankfurter.app/latest";

#[derive(Debug, Deserialize)]
struct Payload {
    base: Currency,
    date: NaiveDate,
    rates: Rates,
}

/// Fetches rates from a Frankfurter-compatible API: `GET <url>?from=<BASE>`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    url: Url,
    retry: RetryConfig,
}

impl HttpFetcher {
    pub fn new(url: Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fx-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url,
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_once(&self, base: Currency) -> Result<ExchangeRateData, FetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .query(&[("from", base.code())])
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Network(error.to_string())
                }
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status));
        }
        let bytes = response.bytes().await.map_err(|error| {
            if error.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Network(error.to_string())
            }
        })?;
        let payload: Payload =
            serde_json::from_slice(&bytes).map_err(|error| FetchError::Parse(error.to_string()))?;
        if payload.base != base {
            return Err(FetchError::Parse(format!(
                "requested {} rates, received {}",
                base, payload.base
            )));
        }
        Ok(ExchangeRateData {
            base,
            date: payload.date,
            rates: payload.rates,
        })
    }
}

#[async_trait]
impl RatesFetcher for HttpFetcher {
    async fn fetch(&self, base: Currency) -> Result<ExchangeRateData, FetchError> {
        debug!(base = %base, url = %self.url, "Fetching exchange rates");
        self.retry
            .run("fetch_rates", || self.fetch_once(base))
            .await
            .map_err(|error| {
                warn!(
                    base = %base,
                    reason = %error.reason(),
                    "Failed to fetch exchange rates: {}",
                    error
                );
                error
            })
    }
}
