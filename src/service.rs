//! Cache-first exchange-rate lookups.
//!
//! A fresh cache entry is served without touching the rate limiter or the upstream.
//! Refreshes are metered per caller, and when a refresh fails an entry past its
//! freshness window is served instead (flagged `cached`, with its original
//! `lastFetched`), so availability wins over freshness. Concurrent refreshes of the
//! same base are not collapsed: each writes the cache and the last write wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use essentials::{debug, info, warn};

use crate::{
    cache::RatesCache,
    fetcher::RatesFetcher,
    rate_limit::RateLimiter,
    rates::{CachedRates, ExchangeRateResponse},
    time::Time,
    Currency, Error, Result,
};

pub type SharedFetcher = Arc<dyn RatesFetcher + Send + Sync + 'static>;

pub struct ExchangeRateService {
    cache: RatesCache,
    limiter: RateLimiter,
    fetcher: SharedFetcher,
}

impl ExchangeRateService {
    pub fn new(
        cache: RatesCache,
        limiter: RateLimiter,
        fetcher: impl RatesFetcher + Send + Sync + 'static,
    ) -> Self {
        Self::shared(cache, limiter, Arc::new(fetcher))
    }

    pub fn shared(cache: RatesCache, limiter: RateLimiter, fetcher: SharedFetcher) -> Self {
        Self {
            cache,
            limiter,
            fetcher,
        }
    }

    pub fn ttl(&self) -> Time {
        self.cache.config().ttl
    }

    /// Rates for `base`, on behalf of `caller` (the rate-limit key).
    pub async fn get_exchange_rates(
        &self,
        base: &str,
        caller: &str,
    ) -> Result<ExchangeRateResponse> {
        let base: Currency = base.parse()?;
        self.get_rates(base, caller, Utc::now()).await
    }

    pub async fn get_rates(
        &self,
        base: Currency,
        caller: &str,
        now: DateTime<Utc>,
    ) -> Result<ExchangeRateResponse> {
        let ttl = self.ttl().as_delta();
        let existing = match self.cache.get(base).await {
            Ok(existing) => existing,
            Err(error) => {
                warn!(base = %base, "Cache unavailable, treating as miss: {:#}", error);
                None
            }
        };
        if let Some(entry) = existing.as_ref().filter(|entry| entry.is_fresh(ttl, now)) {
            debug!(base = %base, fetched_at = %entry.fetched_at, "Serving fresh cached rates");
            return Ok(entry.clone().into_response(true));
        }

        let decision = self.limiter.check_limit_at(caller, now).await;
        if !decision.allowed {
            info!(base = %base, caller, reset_at = %decision.reset_at, "Refresh rate limited");
            return Err(Error::RateLimited {
                reset_at: decision.reset_at,
            });
        }

        match self.fetcher.fetch(base).await {
            Ok(data) => {
                let entry = CachedRates::new(data, now);
                if let Err(error) = self.cache.set(&entry).await {
                    warn!(base = %base, "Failed to store fetched rates: {:#}", error);
                }
                debug!(base = %base, date = %entry.date, "Serving freshly fetched rates");
                Ok(entry.into_response(false))
            }
            Err(error) => match existing {
                Some(stale) => {
                    warn!(
                        base = %base,
                        reason = %error.reason(),
                        fetched_at = %stale.fetched_at,
                        "Upstream failed, serving stale rates"
                    );
                    Ok(stale.into_response(true))
                }
                None => {
                    warn!(
                        base = %base,
                        reason = %error.reason(),
                        "Upstream failed, no cached rates"
                    );
                    Err(Error::UpstreamUnavailable(error))
                }
            },
        }
    }
}
