use async_trait::async_trait;
use http::{header::AsHeaderName, header::IntoHeaderName, HeaderMap, HeaderName, HeaderValue};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::error::ParseError;

pub const RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";

/// Header limit per request; anything beyond is rejected.
const MAX_HEADERS: usize = 100;

/// Longest request or header line accepted, line terminator included.
pub(crate) const MAX_LINE: usize = 8 * 1024;

/// Reads one line of at most [`MAX_LINE`] bytes; an empty string means EOF.
pub(crate) async fn read_bounded_line<R>(reader: &mut R) -> io::Result<String>
where
    R: AsyncBufRead + ?Sized + Unpin,
{
    let mut line = String::new();
    let read = AsyncReadExt::take(&mut *reader, MAX_LINE as u64)
        .read_line(&mut line)
        .await?;
    if read == MAX_LINE && !line.ends_with('\n') {
        return Err(ParseError::LineTooLong(MAX_LINE).into());
    }
    Ok(line)
}

pub trait HeaderMapExt {
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn header<K: AsHeaderName>(&self, key: K) -> Option<&HeaderValue> {
        self.headers().get(key)
    }

    /// Inserts a header, silently skipping values that are not valid header text.
    fn insert_header<K, V>(&mut self, key: K, value: V)
    where
        K: IntoHeaderName,
        V: TryInto<HeaderValue>,
    {
        if let Ok(value) = value.try_into() {
            self.headers_mut().insert(key, value);
        }
    }

    fn get_content_length(&self) -> Option<usize> {
        self.header(http::header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
    }
}

#[async_trait]
pub trait WriteHeaders {
    async fn write_headers(&mut self, headers: &HeaderMap) -> io::Result<()>;
}

#[async_trait]
impl<R> WriteHeaders for R
where
    R: AsyncWrite + ?Sized + Unpin + Send,
{
    async fn write_headers(&mut self, headers: &HeaderMap) -> io::Result<()> {
        for (key, value) in headers {
            self.write_all(key.as_str().as_bytes()).await?;
            self.write_all(b": ").await?;
            self.write_all(value.as_bytes()).await?;
            self.write_all(b"\r\n").await?;
        }
        Ok(())
    }
}

#[async_trait]
pub trait ReadHeaders {
    async fn read_headers(&mut self) -> io::Result<HeaderMap>;
}

#[async_trait]
impl<R> ReadHeaders for R
where
    R: AsyncBufRead + ?Sized + Unpin + Send,
{
    async fn read_headers(&mut self) -> io::Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        loop {
            let line = read_bounded_line(self).await?;
            if line.is_empty() || line == "\r\n" || line == "\n" {
                break;
            }
            if headers.len() >= MAX_HEADERS {
                return Err(ParseError::TooManyHeaders(MAX_HEADERS).into());
            }
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| ParseError::HeaderLine(line.trim_end().to_string()))?;
            headers.append(
                HeaderName::from_bytes(key.trim().as_bytes()).map_err(ParseError::from)?,
                HeaderValue::from_str(value.trim()).map_err(ParseError::from)?,
            );
        }
        Ok(headers)
    }
}
