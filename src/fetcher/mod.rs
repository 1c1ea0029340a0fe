mod http;
mod retry;

use async_trait::async_trait;
use thiserror::Error;

use crate::{rates::ExchangeRateData, Currency};
pub use http::HttpFetcher;
pub use retry::RetryConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Upstream returned status {0}")]
    Http(::http::StatusCode),

    #[error("Malformed payload: {0}")]
    Parse(String),
}

impl FetchError {
    /// Short machine-readable reason: `network`, `http_<status>` or `parse`.
    pub fn reason(&self) -> String {
        match self {
            Self::Network(_) | Self::Timeout => "network".to_string(),
            Self::Http(status) => format!("http_{}", status.as_u16()),
            Self::Parse(_) => "parse".to_string(),
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Http(status) => {
                status.is_server_error() || *status == ::http::StatusCode::TOO_MANY_REQUESTS
            }
            Self::Parse(_) => false,
        }
    }
}

/// Source of current exchange rates for a base currency.
#[async_trait]
pub trait RatesFetcher {
    async fn fetch(&self, base: Currency) -> Result<ExchangeRateData, FetchError>;
}
