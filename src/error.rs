use chrono::{DateTime, Utc};
use http::StatusCode;
use thiserror::Error;

use crate::fetcher::FetchError;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the exchange-rate service and its endpoint.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad input the caller can correct.
    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    /// The upstream API failed and no stale entry was available.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[source] FetchError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to clients; never carries upstream bodies or causes.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::RateLimited { .. } => "Too many requests, please try again later".to_string(),
            Self::UpstreamUnavailable(_) => {
                "Exchange rates are temporarily unavailable".to_string()
            }
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}
