use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::http::handler::{BodyWriter, Handler, HandlerError};
use crate::http::request::Request;
use crate::http::response::{StatusCode, default_headers};
use crate::http::writer::{ResponseWriter, WriteError};

/// Largest chunk written for a chunked body.
const CHUNK_SIZE: usize = 1024;

/// One accepted client stream carrying exactly one request/response cycle.
pub struct Connection<S, H> {
    stream: S,
    handler: Arc<H>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Handling(Request),
    Responding(Reply),
    Closed,
}

/// What gets written back to the client.
pub enum Reply {
    /// Handler succeeded; send 200 with the accumulated body
    Body(BodyWriter),
    /// Parse or handler failure; send the status with the message as body
    Error(HandlerError),
}

impl<S, H> Connection<S, H>
where
    S: AsyncRead + AsyncWrite + Unpin,
    H: Handler,
{
    pub fn new(stream: S, handler: Arc<H>) -> Self {
        Self {
            stream,
            handler,
            state: ConnectionState::Reading,
        }
    }

    /// Drives the connection to completion. The stream is shut down on every
    /// path, including errors.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let result = self.drive().await;

        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "shutdown after response failed");
        }
        self.state = ConnectionState::Closed;

        result
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match Request::from_reader(&mut self.stream).await {
                        Ok(req) => {
                            debug!(
                                method = req.method(),
                                target = req.target(),
                                "request parsed"
                            );
                            ConnectionState::Handling(req)
                        }
                        Err(e) if e.is_transport() => return Err(e.into()),
                        Err(e) => {
                            warn!(error = %e, "rejecting malformed request");
                            ConnectionState::Responding(Reply::Error(HandlerError::bad_request(
                                e.to_string(),
                            )))
                        }
                    };
                }

                ConnectionState::Handling(req) => {
                    let mut body = BodyWriter::new();
                    let reply = match self.handler.call(&mut body, &req).await {
                        Ok(()) => Reply::Body(body),
                        Err(e) => {
                            debug!(status = e.status.as_u16(), "handler returned error");
                            Reply::Error(e)
                        }
                    };
                    self.state = ConnectionState::Responding(reply);
                }

                ConnectionState::Responding(reply) => {
                    reply.write_to_stream(&mut self.stream).await?;
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(())
    }
}

impl Reply {
    /// Serializes the reply as status line, headers and a
    /// `Content-Length`-framed body.
    ///
    /// For a successful body, handler header overrides replace the defaults,
    /// except `Content-Length`, which always matches the bytes written. A
    /// chunked body drops `Content-Length`, is sent in pieces of at most
    /// [`CHUNK_SIZE`] bytes and ends with the handler's trailers.
    pub async fn write_to_stream<W>(self, stream: W) -> Result<(), WriteError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut writer = ResponseWriter::new(stream);

        match self {
            Reply::Error(err) => {
                writer.write_status_line(err.status).await?;
                writer
                    .write_headers(&default_headers(err.message.len()))
                    .await?;
                writer.write_body(err.message.as_bytes()).await?;
            }
            Reply::Body(body) => {
                let mut headers = default_headers(body.len());
                for (name, value) in body.headers().iter() {
                    if name != "content-length" {
                        headers.replace(name, value);
                    }
                }

                writer.write_status_line(StatusCode::Ok).await?;

                if body.is_chunked() {
                    headers.remove("content-length");
                    headers.replace("transfer-encoding", "chunked");
                    for (name, _) in body.trailers().iter() {
                        headers.set("trailer", name);
                    }

                    writer.write_headers(&headers).await?;
                    for chunk in body.as_bytes().chunks(CHUNK_SIZE) {
                        writer.write_chunked_body(chunk).await?;
                    }
                    writer.write_chunked_body_done().await?;
                    writer.write_trailers(body.trailers()).await?;
                } else {
                    writer.write_headers(&headers).await?;
                    writer.write_body(body.as_bytes()).await?;
                }
            }
        }

        writer.flush().await
    }
}
