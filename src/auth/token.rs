use async_trait::async_trait;
use essentials::debug;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;

use super::{bearer_token, AuthResult, Authenticator, ClaimParser, Identity};
use crate::http::Request;

/// Verifies HS256 access tokens signed with the auth provider's shared secret.
pub struct JwtAuthenticator {
    key: DecodingKey,
    validation: Validation,
    claim: String,
}

impl JwtAuthenticator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
            claim: "sub".to_string(),
        }
    }

    pub fn with_audience(mut self, audience: &[&str]) -> Self {
        self.validation.set_audience(audience);
        self.validation.validate_aud = true;
        self
    }

    pub fn with_claim(mut self, claim: impl Into<String>) -> Self {
        self.claim = claim.into();
        self
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, request: &Request) -> AuthResult {
        let token = match bearer_token(request) {
            Some(token) => token,
            None => return AuthResult::Unauthorized,
        };
        let claims = match decode::<Value>(token, &self.key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("Rejected token: {}", e);
                return AuthResult::Unauthorized;
            }
        };
        match claims.parse(&self.claim) {
            Ok(id) => AuthResult::Ok(Identity::new(id)),
            Err(e) => {
                debug!("Token without caller id: {}", e);
                AuthResult::Unauthorized
            }
        }
    }
}
