use std::time::Duration;

use async_trait::async_trait;
use essentials::{debug, warn};
use http::header;
use reqwest::{Client, Url};
use serde_json::Value;

use super::{bearer_token, AuthResult, Authenticator, ClaimParser, Identity};
use crate::http::Request;

/// Asks a hosted auth provider who owns the bearer token, e.g. `GET /auth/v1/user`.
#[derive(Debug, Clone)]
pub struct EndpointAuthenticator {
    client: Client,
    url: Url,
    api_key: Option<String>,
    claim: String,
}

impl EndpointAuthenticator {
    pub fn new(url: Url, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url,
            api_key: None,
            claim: "id".to_string(),
        })
    }

    /// Sent as the `apikey` header on every lookup.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Dotted path of the caller id in the provider's response.
    pub fn with_claim(mut self, claim: impl Into<String>) -> Self {
        self.claim = claim.into();
        self
    }

    async fn lookup(&self, token: &str) -> anyhow::Result<Value> {
        let mut request = self
            .client
            .get(self.url.clone())
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        if let Some(api_key) = &self.api_key {
            request = request.header("apikey", api_key);
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Authenticator for EndpointAuthenticator {
    async fn authenticate(&self, request: &Request) -> AuthResult {
        let token = match bearer_token(request) {
            Some(token) => token,
            None => {
                debug!("no token");
                return AuthResult::Unauthorized;
            }
        };
        let claims = match self.lookup(token).await {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Failed to resolve caller: {}", e);
                return AuthResult::Unauthorized;
            }
        };
        match claims.parse(&self.claim) {
            Ok(id) => AuthResult::Ok(Identity::new(id)),
            Err(e) => {
                warn!("Failed to parse claim: {}", e);
                AuthResult::Unauthorized
            }
        }
    }
}
