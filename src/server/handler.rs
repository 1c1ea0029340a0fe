use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use essentials::{debug, error, info, warn};
use http::{header, Method, StatusCode};
use serde_json::json;
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::TcpStream,
};

use crate::{
    auth::{AuthResult, Authenticator},
    http::{
        error::parse_error, headers, server::Handler, HeaderMapExt, ParseError, ReadRequest,
        Request, Response, WriteResponse,
    },
    service::ExchangeRateService,
    utils::{Also, AsyncAndThen},
    Currency, Error,
};

pub const ROUTE: &str = "/exchange-rates";

pub type SharedAuthenticator = Arc<dyn Authenticator + Send + Sync + 'static>;

/// Serves `GET /exchange-rates?base=<CODE>` for authenticated callers.
pub struct ExchangeRatesHandler {
    service: ExchangeRateService,
    authenticator: SharedAuthenticator,
    read_timeout: Duration,
}

impl ExchangeRatesHandler {
    pub fn new(
        service: ExchangeRateService,
        authenticator: impl Authenticator + Send + Sync + 'static,
    ) -> Self {
        Self::shared(service, Arc::new(authenticator))
    }

    pub fn shared(service: ExchangeRateService, authenticator: SharedAuthenticator) -> Self {
        Self {
            service,
            authenticator,
            read_timeout: Duration::from_secs(10),
        }
    }

    /// Upper bound on receiving the request line and headers.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub async fn handle_request(&self, request: &Request) -> Response {
        if request.route() != ROUTE {
            return error_response(StatusCode::NOT_FOUND, "Not found");
        }
        if request.method != Method::GET {
            let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
            response.insert_header(header::ALLOW, "GET");
            return response;
        }
        let identity = match self.authenticator.authenticate(request).await {
            AuthResult::Ok(identity) => identity,
            AuthResult::Unauthorized => return into_response(&Error::Unauthorized),
        };
        // `?base=` counts as omitted.
        let base = match request.query("base").filter(|base| !base.trim().is_empty()) {
            Some(base) => base,
            None => Currency::default().code().to_string(),
        };
        let base = match base.parse::<Currency>() {
            Ok(base) => base,
            Err(e) => return into_response(&e),
        };
        match self
            .service
            .get_exchange_rates(base.code(), &identity.id)
            .await
        {
            Ok(rates) => {
                let remaining = self
                    .service
                    .ttl()
                    .as_delta()
                    .checked_sub(&(Utc::now() - rates.last_fetched))
                    .map_or(i64::MAX, |remaining| remaining.num_milliseconds());
                let max_age = remaining.max(0).saturating_add(999) / 1000;
                let mut response = Response::json(StatusCode::OK, &rates);
                response.insert_header(
                    header::CACHE_CONTROL,
                    format!("private, max-age={}", max_age),
                );
                response
            }
            Err(e) => {
                let caller = identity.id.as_str();
                match &e {
                    Error::Internal(cause) => {
                        error!(base = %base, caller, "Request failed: {:?}", cause)
                    }
                    Error::UpstreamUnavailable(cause) => warn!(
                        base = %base,
                        caller,
                        reason = %cause.reason(),
                        "Request failed: {}",
                        cause
                    ),
                    other => info!(base = %base, caller, "Request rejected: {}", other),
                }
                into_response(&e)
            }
        }
    }

    async fn respond(&self, stream: &mut TcpStream) -> std::io::Result<()> {
        let (mut rx, mut tx) = stream.split();
        let mut reader = BufReader::new(&mut rx);
        let request = tokio::time::timeout(self.read_timeout, reader.read_request()).await;
        let mut response = match request {
            Ok(Ok(request)) => {
                debug!(
                    target: "handler",
                    stage = "request",
                    method = %request.method,
                    route = request.route(),
                    "1 - parsed request header"
                );
                self.handle_request(&request).await
            }
            Ok(Err(e)) if matches!(parse_error(&e), Some(ParseError::Empty)) => {
                debug!("Connection closed without a request");
                return Ok(());
            }
            Ok(Err(e)) => {
                debug!("Malformed request: {}", e);
                error_response(StatusCode::BAD_REQUEST, "Bad request")
            }
            Err(_) => error_response(StatusCode::REQUEST_TIMEOUT, "Request timeout"),
        };
        response.insert_header(header::CONNECTION, "close");
        tx.write_response(&response)
            .await
            .also(|_| {
                debug!(
                    target: "handler",
                    stage = "response",
                    status = %response.status,
                    "2 - wrote response"
                )
            })
            .async_and_then(|_| async move { tx.shutdown().await })
            .await
    }
}

#[async_trait]
impl Handler for ExchangeRatesHandler {
    async fn handle(&self, mut stream: TcpStream) {
        let ip = stream.peer_addr().ok();
        match self.respond(&mut stream).await {
            Ok(_) => {
                debug!(ip = ?ip, "Connection closed");
            }
            Err(err) => {
                warn!(ip = ?ip, "Failed to write response: {}", err);
            }
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    Response::json(status, &json!({ "error": message }))
}

fn into_response(e: &Error) -> Response {
    let mut response = error_response(e.status(), &e.public_message());
    if let Error::RateLimited { reset_at } = e {
        let retry_after = (*reset_at - Utc::now()).num_seconds().max(1);
        response.insert_header(header::RETRY_AFTER, retry_after.to_string());
        response.insert_header(headers::RATE_LIMIT_RESET, reset_at.timestamp().to_string());
    }
    response
}
