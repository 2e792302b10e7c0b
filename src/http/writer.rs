use std::io;

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::headers::{CRLF, HeaderMap};
use crate::http::response::StatusCode;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Position of a [`ResponseWriter`] within one response.
///
/// ```text
/// StatusLine ─▶ Headers ─▶ Body ─┬─────────────────────────────▶ (end)
///                                └─ chunked done ─▶ Trailers ─▶ Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    StatusLine,
    Headers,
    Body,
    Trailers,
    Done,
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot {operation}: expected state {expected:?}, but current state is {actual:?}")]
    InvalidWriterState {
        operation: &'static str,
        expected: WriterState,
        actual: WriterState,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    StatusLine,
    Headers,
    Body,
    ChunkedBody,
    ChunkedBodyDone,
    Trailers,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::StatusLine => "write status line",
            Operation::Headers => "write headers",
            Operation::Body => "write body",
            Operation::ChunkedBody => "write chunked body",
            Operation::ChunkedBodyDone => "finish chunked body",
            Operation::Trailers => "write trailers",
        }
    }

    /// The state an operation requires and the state it leaves behind.
    fn transition(self) -> (WriterState, WriterState) {
        match self {
            Operation::StatusLine => (WriterState::StatusLine, WriterState::Headers),
            Operation::Headers => (WriterState::Headers, WriterState::Body),
            Operation::Body | Operation::ChunkedBody => (WriterState::Body, WriterState::Body),
            Operation::ChunkedBodyDone => (WriterState::Body, WriterState::Trailers),
            Operation::Trailers => (WriterState::Trailers, WriterState::Done),
        }
    }
}

/// Writes one HTTP response to `W`, rejecting calls made out of order.
///
/// Every operation checks the current state first; a failed check writes
/// nothing and leaves the state unchanged.
pub struct ResponseWriter<W> {
    inner: W,
    state: WriterState,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            state: WriterState::StatusLine,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), WriteError> {
        let next = self.check(Operation::StatusLine)?;

        let line = format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            status.as_u16(),
            status.reason_phrase()
        );
        self.inner.write_all(line.as_bytes()).await?;

        self.state = next;
        Ok(())
    }

    pub async fn write_headers(&mut self, headers: &HeaderMap) -> Result<(), WriteError> {
        let next = self.check(Operation::Headers)?;

        let mut buf = Vec::new();
        headers.write_lines(&mut buf);
        self.inner.write_all(&buf).await?;

        self.state = next;
        Ok(())
    }

    /// Writes body bytes verbatim. May be called repeatedly; framing must
    /// already have been declared in the headers.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, WriteError> {
        self.check(Operation::Body)?;
        self.inner.write_all(body).await?;
        Ok(body.len())
    }

    /// Writes `chunk` framed as one chunk of a chunked body.
    ///
    /// An empty chunk writes nothing, since a zero-length chunk would end
    /// the body; use [`ResponseWriter::write_chunked_body_done`] for that.
    pub async fn write_chunked_body(&mut self, chunk: &[u8]) -> Result<usize, WriteError> {
        self.check(Operation::ChunkedBody)?;
        if chunk.is_empty() {
            return Ok(0);
        }

        let mut buf = Vec::with_capacity(chunk.len() + 12);
        buf.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        buf.extend_from_slice(chunk);
        buf.extend_from_slice(CRLF);
        self.inner.write_all(&buf).await?;

        Ok(buf.len())
    }

    /// Writes the terminating zero-length chunk. Trailers (possibly none)
    /// must follow.
    pub async fn write_chunked_body_done(&mut self) -> Result<usize, WriteError> {
        let next = self.check(Operation::ChunkedBodyDone)?;

        let last = b"0\r\n";
        self.inner.write_all(last).await?;

        self.state = next;
        Ok(last.len())
    }

    pub async fn write_trailers(&mut self, trailers: &HeaderMap) -> Result<(), WriteError> {
        let next = self.check(Operation::Trailers)?;

        let mut buf = Vec::new();
        trailers.write_lines(&mut buf);
        self.inner.write_all(&buf).await?;

        self.state = next;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), WriteError> {
        self.inner.flush().await?;
        Ok(())
    }

    fn check(&self, operation: Operation) -> Result<WriterState, WriteError> {
        let (expected, next) = operation.transition();
        if self.state != expected {
            return Err(WriteError::InvalidWriterState {
                operation: operation.name(),
                expected,
                actual: self.state,
            });
        }
        Ok(next)
    }
}
