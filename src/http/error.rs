use http::header::{InvalidHeaderName, InvalidHeaderValue};
use thiserror::Error;
use tokio::io;

/// Why an incoming request head could not be read.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("connection closed before a request line was received")]
    Empty,

    #[error("malformed request line: {0:?}")]
    RequestLine(String),

    #[error("invalid method: {0}")]
    Method(String),

    #[error("request target is not an origin path: {0}")]
    Target(String),

    #[error("unsupported protocol version: {0}")]
    Version(String),

    #[error("malformed header line: {0:?}")]
    HeaderLine(String),

    #[error(transparent)]
    HeaderName(#[from] InvalidHeaderName),

    #[error(transparent)]
    HeaderValue(#[from] InvalidHeaderValue),

    #[error("line longer than {0} bytes")]
    LineTooLong(usize),

    #[error("more than {0} headers")]
    TooManyHeaders(usize),
}

impl From<ParseError> for io::Error {
    fn from(value: ParseError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, value)
    }
}

/// The [`ParseError`] behind an `io::Error`, if reading failed on malformed input.
pub fn parse_error(error: &io::Error) -> Option<&ParseError> {
    error.get_ref()?.downcast_ref()
}
