use fx_gateway::{
    auth::EndpointAuthenticator,
    cache::{self, RatesCache},
    fetcher::{HttpFetcher, RetryConfig},
    rate_limit::{self, FailurePolicy, Quota, RateLimiter},
    time::Time,
    ExchangeRateService,
};
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use testing_utils::surf;
use tokio::task::JoinHandle;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

pub const TOKEN: &str = "hello_world";

pub struct Context {
    #[allow(dead_code)]
    pub app: u16,
    #[allow(dead_code)]
    pub upstream: MockServer,
    _auth_server: MockServer,
    _app_server: JoinHandle<()>,
}

impl Context {
    #[allow(dead_code)]
    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.app, path)
    }

    #[allow(dead_code)]
    pub async fn upstream_calls(&self) -> usize {
        self.upstream
            .received_requests()
            .await
            .unwrap_or_default()
            .len()
    }
}

/// Starts the server against mocked rate and auth providers, allowing `requests`
/// cache refreshes per caller per minute.
#[allow(dead_code)]
pub async fn setup(requests: u64) -> Context {
    setup_system();
    let upstream = create_upstream_server().await;
    let auth = create_auth_server().await;
    let ports = testing_utils::get_random_ports(2);
    let service = ExchangeRateService::new(
        RatesCache::new(cache::Config::default(), cache::InMemoryDatastore::new()),
        RateLimiter::new(
            rate_limit::Config::new(
                Quota::new(requests, Time::seconds(60)),
                FailurePolicy::Closed,
            ),
            rate_limit::InMemoryDatastore::new(),
        ),
        HttpFetcher::new(
            format!("{}/latest", upstream.uri()).parse().unwrap(),
            Duration::from_secs(2),
        )
        .unwrap()
        .with_retry(RetryConfig::disabled()),
    );
    let authenticator = EndpointAuthenticator::new(
        format!("{}/auth/v1/user", auth.uri()).parse().unwrap(),
        Duration::from_secs(2),
    )
    .unwrap()
    .with_api_key("anon");
    let server = fx_gateway::builder(service, authenticator)
        .with_app_port(ports[0])
        .with_health_check_port(ports[1])
        .build();
    let server_thread = tokio::spawn(server.run());
    wait_for_server(ports[1]).await;
    Context {
        app: ports[0],
        upstream,
        _auth_server: auth,
        _app_server: server_thread,
    }
}

fn setup_system() {
    if env::var("CI").is_err() {
        env::set_var("APP_ENV", "d");
        env::set_var("RUST_LOG", "debug");
        env::set_var("RUST_BACKTRACE", "0");
        essentials::install();
    }
}

async fn start_mock_server() -> MockServer {
    let listener = std::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).unwrap();
    MockServer::builder().listener(listener).start().await
}

async fn create_upstream_server() -> MockServer {
    let server = start_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .and(query_param("from", "EUR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "amount": 1.0,
            "base": "EUR",
            "date": "2025-01-15",
            "rates": { "USD": 1.08, "GBP": 0.86 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .and(query_param("from", "USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "amount": 1.0,
            "base": "USD",
            "date": "2025-01-15",
            "rates": { "EUR": 0.93, "GBP": 0.8 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .and(query_param("from", "GBP"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream stack trace"))
        .mount(&server)
        .await;
    server
}

async fn create_auth_server() -> MockServer {
    let server = start_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("Authorization", format!("Bearer {TOKEN}").as_str()))
        .and(header("apikey", "anon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-1",
            "email": "john@doe.com"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "msg": "invalid JWT" })))
        .mount(&server)
        .await;
    server
}

async fn wait_for_server(health_check: u16) {
    let mut interval = tokio::time::interval(tokio::time::Duration::from_millis(100));
    loop {
        if let Ok(response) = surf::get(format!("http://127.0.0.1:{}", health_check)).await {
            if response.status() == 200 {
                break;
            }
        }
        interval.tick().await;
    }
}
