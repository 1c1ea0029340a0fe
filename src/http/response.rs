use super::{headers::HeaderMapExt, WriteHeaders};
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::Serialize;
use tokio::io::{self, AsyncWrite, AsyncWriteExt};

#[derive(Debug)]
pub struct Response {
    pub version: String,
    pub status: StatusCode,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            version: "HTTP/1.1".to_string(),
            status,
            headers: vec![(header::CONTENT_LENGTH, HeaderValue::from_static("0"))]
                .into_iter()
                .collect(),
            body: None,
        }
    }

    pub fn error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// A response with a JSON body; falls back to a bare 500 if `value` cannot be encoded.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                let mut response = Self::new(status);
                response.insert_header(header::CONTENT_TYPE, "application/json");
                response.set_body(body);
                response
            }
            Err(_) => Self::error(),
        }
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        let body = body.into();
        self.insert_header(header::CONTENT_LENGTH, body.len());
        self.body = Some(body);
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

impl HeaderMapExt for Response {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}

#[async_trait::async_trait]
pub trait WriteResponse {
    async fn write_response(&mut self, response: &Response) -> io::Result<()>;
}

#[async_trait::async_trait]
impl<R> WriteResponse for R
where
    R: AsyncWrite + ?Sized + Unpin + Send,
{
    async fn write_response(&mut self, response: &Response) -> io::Result<()> {
        self.write_all(response.version.as_bytes()).await?;
        self.write_all(b" ").await?;
        self.write_all(response.status.as_str().as_bytes()).await?;
        self.write_all(b" ").await?;
        if let Some(reason) = response.status.canonical_reason() {
            self.write_all(reason.as_bytes()).await?;
        }
        self.write_all(b"\r\n").await?;
        self.write_headers(&response.headers).await?;
        self.write_all(b"\r\n").await?;
        if let Some(body) = response.body.as_ref() {
            self.write_all(body).await?;
        }
        self.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_json_response() {
        let response = Response::json(
            StatusCode::BAD_REQUEST,
            &serde_json::json!({ "error": "nope" }),
        );
        let mut output = Vec::new();
        output.write_response(&response).await.unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(output.contains("content-length: 16\r\n"));
        assert!(output.contains("content-type: application/json\r\n"));
        assert!(output.ends_with("\r\n\r\n{\"error\":\"nope\"}"));
    }

    #[test]
    fn test_empty_response() {
        let response = Response::new(StatusCode::NOT_FOUND);
        assert_eq!(response.get_content_length(), Some(0));
        assert!(response.body().is_none());
    }
}
