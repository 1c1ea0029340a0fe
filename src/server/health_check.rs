use async_trait::async_trait;
use essentials::warn;
use http::{header, StatusCode};
use serde_json::json;
use std::time::Duration;
use tokio::{io::BufReader, net::TcpStream};

use crate::http::{server::Handler, HeaderMapExt, ReadRequest, Response, WriteResponse};

/// Liveness check: every connection gets `200 {"status":"ok"}`, whatever it asked for.
pub struct HealthCheck;

impl HealthCheck {
    fn response() -> Response {
        let mut response = Response::json(StatusCode::OK, &json!({ "status": "ok" }));
        response.insert_header(header::CONNECTION, "close");
        response
    }
}

#[async_trait]
impl Handler for HealthCheck {
    async fn handle(&self, mut stream: TcpStream) {
        // Drain the request head so closing does not reset the connection.
        {
            let mut reader = BufReader::new(&mut stream);
            let _ = tokio::time::timeout(Duration::from_secs(1), reader.read_request()).await;
        }
        if let Err(e) = stream.write_response(&Self::response()).await {
            warn!("Failed to write health check response: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_response() {
        let mut output = Vec::new();
        output.write_response(&HealthCheck::response()).await.unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(output.ends_with("\r\n\r\n{\"status\":\"ok\"}"));
    }
}
