//! Just enough HTTP/1.1 to serve one request per connection.

pub mod error;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use error::ParseError;
pub use headers::{HeaderMapExt, ReadHeaders, WriteHeaders};
pub use request::{ReadRequest, Request};
pub use response::{Response, WriteResponse};
