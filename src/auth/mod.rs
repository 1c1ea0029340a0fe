//! Resolves the caller behind a request.

mod claims;
mod remote;
mod token;

use async_trait::async_trait;
use http::header;

use crate::http::{HeaderMapExt, Request};
pub use claims::ClaimParser;
pub use remote::EndpointAuthenticator;
pub use token::JwtAuthenticator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthResult {
    Ok(Identity),
    Unauthorized,
}

#[async_trait]
pub trait Authenticator {
    async fn authenticate(&self, request: &Request) -> AuthResult;
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(request: &Request) -> Option<&str> {
    request
        .header(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_bearer_token() {
        let mut request = Request::new(Method::GET, "/");
        assert_eq!(bearer_token(&request), None);
        request.insert_header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&request), None);
        request.insert_header(header::AUTHORIZATION, "Bearer ");
        assert_eq!(bearer_token(&request), None);
        request.insert_header(header::AUTHORIZATION, "Bearer abc.def");
        assert_eq!(bearer_token(&request), Some("abc.def"));
    }
}
