use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::Currency;

/// Target currency code to the amount of it one unit of the base buys.
pub type Rates = BTreeMap<String, f64>;

/// Rates as returned by the upstream API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateData {
    pub base: Currency,
    pub date: NaiveDate,
    pub rates: Rates,
}

/// The persisted cache record, one per base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedRates {
    pub base: Currency,
    pub date: NaiveDate,
    pub rates: Rates,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRates {
    pub fn new(data: ExchangeRateData, fetched_at: DateTime<Utc>) -> Self {
        Self {
            base: data.base,
            date: data.date,
            rates: data.rates,
            fetched_at,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.fetched_at)
    }

    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < ttl
    }

    pub fn into_response(self, cached: bool) -> ExchangeRateResponse {
        ExchangeRateResponse {
            base: self.base,
            rates: self.rates,
            date: self.date,
            cached,
            last_fetched: self.fetched_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateResponse {
    pub base: Currency,
    pub rates: Rates,
    pub date: NaiveDate,
    pub cached: bool,
    pub last_fetched: DateTime<Utc>,
}
