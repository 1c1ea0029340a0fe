use std::{net::IpAddr, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use essentials::{info, warn};
use fx_gateway::{
    auth::{EndpointAuthenticator, JwtAuthenticator},
    cache::{self, RatesCache},
    fetcher::{HttpFetcher, RetryConfig},
    rate_limit::{self, FailurePolicy, Quota, RateLimiter},
    server::handler::SharedAuthenticator,
    time::Time,
    ExchangeRateService, ServerBuilder,
};
use reqwest::Url;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "fx-gateway", about = "Rate-limited, cached exchange-rate endpoint")]
struct Opt {
    #[structopt(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    #[structopt(long, env = "PORT", default_value = "80")]
    port: u16,

    #[structopt(long, env = "HEALTHCHECK_PORT", default_value = "9000")]
    healthcheck_port: u16,

    /// Shared store for the cache and the limiter; in-memory stores are used when unset.
    #[structopt(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    #[structopt(long, env = "RATES_API_URL", default_value = "https://api.frankfurter.app/latest")]
    rates_api_url: Url,

    /// Freshness window of cached rates, in seconds.
    #[structopt(long, env = "CACHE_TTL", default_value = "86400")]
    cache_ttl: u64,

    /// How long past freshness an entry is kept for fallback, in seconds.
    #[structopt(long, env = "CACHE_STALE_RETENTION", default_value = "604800")]
    cache_stale_retention: u64,

    #[structopt(long, env = "RATE_LIMIT_REQUESTS", default_value = "60")]
    rate_limit_requests: u64,

    /// Rate limit window, in seconds.
    #[structopt(long, env = "RATE_LIMIT_WINDOW", default_value = "3600")]
    rate_limit_window: u64,

    /// `open` admits refreshes while the limiter store is down, `closed` rejects them.
    #[structopt(long, env = "RATE_LIMIT_FAILURE_POLICY", default_value = "open")]
    rate_limit_failure_policy: FailurePolicy,

    #[structopt(long, env = "FETCH_TIMEOUT_MS", default_value = "5000")]
    fetch_timeout_ms: u64,

    #[structopt(long, env = "FETCH_ATTEMPTS", default_value = "2")]
    fetch_attempts: u32,

    /// Bound on every cache and limiter store call.
    #[structopt(long, env = "BACKEND_TIMEOUT_MS", default_value = "2000")]
    backend_timeout_ms: u64,

    /// Remote user endpoint resolving bearer tokens, e.g. `https://<project>/auth/v1/user`.
    #[structopt(long, env = "AUTH_URL")]
    auth_url: Option<Url>,

    #[structopt(long, env = "AUTH_API_KEY")]
    auth_api_key: Option<String>,

    /// Dotted path of the caller id in the auth endpoint's response.
    #[structopt(long, env = "AUTH_CLAIM", default_value = "id")]
    auth_claim: String,

    /// HS256 secret; tokens are verified locally instead of calling `AUTH_URL`.
    #[structopt(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,
}

struct Datastores {
    cache: cache::SharedDatastore,
    rate_limit: rate_limit::SharedDatastore,
}

#[cfg(feature = "redis")]
async fn datastores(redis_url: Option<&str>) -> Result<Datastores> {
    use bb8_redis::{bb8::Pool, RedisConnectionManager};

    let Some(url) = redis_url else {
        return Ok(in_memory());
    };
    let manager = RedisConnectionManager::new(url).context("Invalid REDIS_URL")?;
    let pool = Pool::builder()
        .build(manager)
        .await
        .context("Failed to create redis pool")?;
    info!("Using redis datastores");
    Ok(Datastores {
        cache: Arc::new(cache::RedisDatastore::new(pool.clone())),
        rate_limit: Arc::new(rate_limit::RedisDatastore::new(pool)),
    })
}

#[cfg(not(feature = "redis"))]
async fn datastores(redis_url: Option<&str>) -> Result<Datastores> {
    if redis_url.is_some() {
        warn!("Built without the redis feature, ignoring REDIS_URL");
    }
    Ok(in_memory())
}

fn in_memory() -> Datastores {
    warn!("Using in-memory datastores, state is not shared between instances");
    Datastores {
        cache: Arc::new(cache::InMemoryDatastore::new()),
        rate_limit: Arc::new(rate_limit::InMemoryDatastore::new()),
    }
}

fn authenticator(opt: &Opt) -> Result<SharedAuthenticator> {
    let timeout = Duration::from_millis(opt.backend_timeout_ms);
    if let Some(secret) = &opt.jwt_secret {
        info!("Verifying bearer tokens locally");
        return Ok(Arc::new(JwtAuthenticator::new(secret.as_bytes())));
    }
    let Some(url) = opt.auth_url.clone() else {
        bail!("Either JWT_SECRET or AUTH_URL must be set");
    };
    info!(url = %url, "Resolving bearer tokens remotely");
    let mut authenticator = EndpointAuthenticator::new(url, timeout)?.with_claim(&opt.auth_claim);
    if let Some(api_key) = &opt.auth_api_key {
        authenticator = authenticator.with_api_key(api_key);
    }
    Ok(Arc::new(authenticator))
}

#[tokio::main]
async fn main() -> Result<()> {
    essentials::install();
    let opt = Opt::from_args();
    let backend_timeout = Time::from(Duration::from_millis(opt.backend_timeout_ms));

    let datastores = datastores(opt.redis_url.as_deref()).await?;
    let cache = RatesCache::shared(
        cache::Config::new(Time::seconds(opt.cache_ttl))
            .with_stale_retention(Time::seconds(opt.cache_stale_retention))
            .with_timeout(backend_timeout),
        datastores.cache,
    );
    let quota = Quota::new(opt.rate_limit_requests, Time::seconds(opt.rate_limit_window));
    info!(
        requests = quota.requests,
        window = %quota.window,
        policy = %opt.rate_limit_failure_policy,
        "Rate limiting cache refreshes"
    );
    let limiter = RateLimiter::shared(
        rate_limit::Config::new(quota, opt.rate_limit_failure_policy).with_timeout(backend_timeout),
        datastores.rate_limit,
    );
    let fetcher = HttpFetcher::new(
        opt.rates_api_url.clone(),
        Duration::from_millis(opt.fetch_timeout_ms),
    )?
    .with_retry(RetryConfig::default().max_attempts(opt.fetch_attempts));

    let service = ExchangeRateService::new(cache, limiter, fetcher);
    info!(host = %opt.host, port = opt.port, "Starting exchange-rate server");
    ServerBuilder::new(service, authenticator(&opt)?)
        .with_host(opt.host)
        .with_app_port(opt.port)
        .with_health_check_port(opt.healthcheck_port)
        .build()
        .run()
        .await;
    Ok(())
}
