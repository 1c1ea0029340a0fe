use super::{
    error::ParseError,
    headers::{read_bounded_line, HeaderMapExt},
    ReadHeaders,
};
use async_trait::async_trait;
use http::{HeaderMap, Method};
use reqwest::Url;
use tokio::io::{self, AsyncBufRead};

#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub version: String,
    headers: HeaderMap,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            version: "HTTP/1.1".to_string(),
            headers: HeaderMap::new(),
        }
    }

    /// Path without the query string.
    pub fn route(&self) -> &str {
        self.path
            .split_once('?')
            .map(|(route, _)| route)
            .unwrap_or(&self.path)
    }

    /// First value of a query parameter, percent-decoded.
    pub fn query(&self, key: &str) -> Option<String> {
        let url = Url::parse("http://localhost")
            .and_then(|base| base.join(&self.path))
            .ok()?;
        url.query_pairs()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }
}

impl HeaderMapExt for Request {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}

#[async_trait]
pub trait ReadRequest {
    async fn read_request(&mut self) -> io::Result<Request>;
}

#[async_trait]
impl<R> ReadRequest for R
where
    R: AsyncBufRead + ?Sized + Unpin + Send,
{
    async fn read_request(&mut self) -> io::Result<Request> {
        let request_line = read_bounded_line(self).await?;
        if request_line.trim().is_empty() {
            return Err(ParseError::Empty.into());
        }
        let parts = request_line.split_whitespace().collect::<Vec<_>>();
        let [method, path, version] = parts[..] else {
            return Err(ParseError::RequestLine(request_line.trim_end().to_string()).into());
        };
        let method = method
            .parse::<Method>()
            .map_err(|_| ParseError::Method(method.to_string()))?;
        if !path.starts_with('/') {
            return Err(ParseError::Target(path.to_string()).into());
        }
        if !version.starts_with("HTTP/1.") {
            return Err(ParseError::Version(version.to_string()).into());
        }
        let (path, version) = (path.to_string(), version.to_string());
        Ok(Request {
            method,
            path,
            version,
            headers: self.read_headers().await?,
        })
    }
}
