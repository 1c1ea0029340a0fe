//! Rate-limited, cached exchange-rate endpoint.
//!
//! Serves `GET /exchange-rates?base=<EUR|USD|GBP>` to authenticated callers. Rates are
//! cached per base currency; only cache refreshes count against the caller's quota, and
//! when the upstream API fails the last known rates are served instead.
//!
//! # Example usage
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use fx_gateway::{
//!     auth::JwtAuthenticator,
//!     cache::{self, RatesCache},
//!     fetcher::HttpFetcher,
//!     rate_limit::{self, FailurePolicy, Quota, RateLimiter},
//!     time::Time,
//!     ExchangeRateService,
//! };
//!
//! # async fn run() -> anyhow::Result<()> {
//! essentials::install();
//! let service = ExchangeRateService::new(
//!     RatesCache::new(cache::Config::default(), cache::InMemoryDatastore::new()),
//!     RateLimiter::new(
//!         rate_limit::Config::new(Quota::new(60, Time::seconds(3600)), FailurePolicy::Open),
//!         rate_limit::InMemoryDatastore::new(),
//!     ),
//!     HttpFetcher::new(
//!         "https://api.frankfurter.app/latest".parse()?,
//!         Duration::from_secs(5),
//!     )?,
//! );
//! fx_gateway::builder(service, JwtAuthenticator::new(b"secret"))
//!     .with_app_port(8080)
//!     .build()
//!     .run()
//!     .await;
//! # Ok(())
//! # }
//! ```
pub mod auth;
pub mod cache;
pub mod currency;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod rate_limit;
pub mod rates;
pub mod server;
pub mod service;
pub(crate) mod utils;

pub use currency::Currency;
pub use error::{Error, Result};
pub use server::app::{builder, Server, ServerBuilder};
pub use service::ExchangeRateService;
pub use utils::time;
