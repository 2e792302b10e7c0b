use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::http::headers::{decode_field, find_crlf};
use crate::http::request::{ParserState, Request, RequestLine};

/// Size of the read buffer before the first growth.
const INITIAL_BUFFER_SIZE: usize = 8;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),

    #[error("invalid header token found: {0}")]
    InvalidHeaderToken(String),

    #[error("malformed header line: {0}")]
    MalformedHeaderLine(String),

    #[error("poorly formatted request-line: {0}")]
    MalformedRequestLine(String),

    #[error("invalid method: {0}")]
    InvalidMethod(String),

    #[error("malformed HTTP version: {0}")]
    MalformedVersion(String),

    #[error("unrecognized HTTP-version: {0}")]
    UnrecognizedVersion(String),

    #[error("incomplete request, in state: {state}, read {bytes_read} bytes before EOF")]
    IncompleteRequest { state: ParserState, bytes_read: usize },

    #[error("trying to read data in a done state")]
    AlreadyDone,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    /// True when the failure came from the underlying stream rather than from
    /// the bytes the client sent.
    pub fn is_transport(&self) -> bool {
        matches!(self, ParseError::Io { .. })
    }
}

/// Parses the request line at the front of `data`.
///
/// Returns `Ok(None)` when no complete line is buffered yet. On success the
/// consumed length includes the trailing CRLF.
pub fn parse_request_line(data: &[u8]) -> Result<Option<(RequestLine, usize)>, ParseError> {
    let idx = match find_crlf(data) {
        Some(idx) => idx,
        None => return Ok(None),
    };

    let request_line = request_line_from_bytes(&data[..idx])?;
    Ok(Some((request_line, idx + 2)))
}

/// Splits on single spaces. The method must be ASCII uppercase; the target
/// is decoded leniently so obs-text octets survive.
fn request_line_from_bytes(line: &[u8]) -> Result<RequestLine, ParseError> {
    let parts: Vec<&[u8]> = line.split(|&b| b == b' ').collect();
    let &[method, target, version] = parts.as_slice() else {
        return Err(ParseError::MalformedRequestLine(decode_field(line)));
    };

    if method.is_empty() || !method.iter().all(|b| b.is_ascii_uppercase()) {
        return Err(ParseError::InvalidMethod(decode_field(method)));
    }

    let version = decode_field(version);

    let (protocol, number) = match version.split('/').collect::<Vec<_>>().as_slice() {
        &[protocol, number] => (protocol, number),
        _ => return Err(ParseError::MalformedVersion(version.clone())),
    };

    if protocol != "HTTP" {
        return Err(ParseError::UnrecognizedVersion(protocol.to_string()));
    }
    if number != "1.1" {
        return Err(ParseError::UnrecognizedVersion(number.to_string()));
    }

    Ok(RequestLine {
        method: decode_field(method),
        target: decode_field(target),
        version: number.to_string(),
    })
}

impl Request {
    /// Reads from `reader` until a full request line and header block have
    /// been parsed.
    ///
    /// The read buffer starts small and doubles whenever it fills up. After
    /// every parse pass the consumed bytes are shifted out of the front so
    /// only the unparsed tail is kept between reads.
    pub async fn from_reader<R>(mut reader: R) -> Result<Request, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; INITIAL_BUFFER_SIZE];
        let mut read_to = 0;
        let mut total_read = 0;
        let mut request = Request::new();

        while !request.is_done() {
            if read_to >= buf.len() {
                let mut grown = vec![0u8; buf.len() * 2];
                grown[..read_to].copy_from_slice(&buf[..read_to]);
                buf = grown;
                trace!(capacity = buf.len(), "grew request buffer");
            }

            let n = reader.read(&mut buf[read_to..]).await?;
            if n == 0 {
                return Err(ParseError::IncompleteRequest {
                    state: request.state,
                    bytes_read: total_read,
                });
            }
            read_to += n;
            total_read += n;

            let parsed = request.parse(&buf[..read_to])?;
            buf.copy_within(parsed..read_to, 0);
            read_to -= parsed;
        }

        Ok(request)
    }

    /// Consumes as many complete syntactic units from `data` as possible.
    ///
    /// Returns the total number of bytes consumed, which may be zero if
    /// `data` holds only a partial line.
    pub fn parse(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        if self.is_done() {
            return Err(ParseError::AlreadyDone);
        }

        let mut total = 0;
        while !self.is_done() {
            let n = self.parse_single(&data[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }

    fn parse_single(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        match self.state {
            ParserState::Initialized => match parse_request_line(data)? {
                Some((request_line, n)) => {
                    self.request_line = request_line;
                    self.state = ParserState::ParsingHeaders;
                    Ok(n)
                }
                None => Ok(0),
            },
            ParserState::ParsingHeaders => {
                let (n, done) = self.headers.parse(data)?;
                if done {
                    self.state = ParserState::Done;
                }
                Ok(n)
            }
            ParserState::Done => Err(ParseError::AlreadyDone),
        }
    }
}
