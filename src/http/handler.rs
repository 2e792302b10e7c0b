use std::fmt;
use std::future::Future;

use bytes::BytesMut;

use crate::http::headers::HeaderMap;
use crate::http::request::Request;
use crate::http::response::StatusCode;

/// Application logic invoked once per parsed request.
///
/// The handler writes the response body into `body`. Returning
/// `Err(HandlerError)` discards the body and answers with the error's status
/// code and message instead.
pub trait Handler: Send + Sync + 'static {
    fn call(
        &self,
        body: &mut BodyWriter,
        req: &Request,
    ) -> impl Future<Output = Result<(), HandlerError>> + Send;
}

/// A business-level failure raised by a [`Handler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    pub status: StatusCode,
    pub message: String,
}

impl HandlerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BadRequest, message)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for HandlerError {}

/// Body sink handed to a [`Handler`].
///
/// Bytes accumulate in memory; the connection writes them with a matching
/// `Content-Length` once the handler returns. Entries in [`headers_mut`]
/// replace the default response headers of the same name.
///
/// After [`set_chunked`] or [`set_trailer`] the body goes out with
/// `Transfer-Encoding: chunked` instead, followed by the trailers.
///
/// [`headers_mut`]: BodyWriter::headers_mut
/// [`set_chunked`]: BodyWriter::set_chunked
/// [`set_trailer`]: BodyWriter::set_trailer
#[derive(Debug, Default)]
pub struct BodyWriter {
    buf: BytesMut,
    headers: HeaderMap,
    chunked: bool,
    trailers: HeaderMap,
}

impl BodyWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, data: impl AsRef<[u8]>) {
        self.buf.extend_from_slice(data.as_ref());
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn set_chunked(&mut self) {
        self.chunked = true;
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    /// Sets a trailer field sent after the last chunk. Implies chunked
    /// framing; the name is also announced in the `Trailer` header.
    pub fn set_trailer(&mut self, name: &str, value: &str) {
        self.chunked = true;
        self.trailers.replace(name, value);
    }

    pub fn trailers(&self) -> &HeaderMap {
        &self.trailers
    }
}
