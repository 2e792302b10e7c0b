use std::fmt;

use crate::http::headers::HeaderMap;

/// The first line of an HTTP request.
///
/// `version` holds only the numeric part, e.g. `"1.1"` for `HTTP/1.1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLine {
    /// Request method, uppercase ASCII letters only (e.g. "GET")
    pub method: String,
    /// The request target as sent (e.g. "/video?x=1")
    pub target: String,
    /// HTTP version without the "HTTP/" prefix
    pub version: String,
}

/// Progress of the incremental request parser.
///
/// ```text
/// Initialized ──request line──▶ ParsingHeaders ──blank line──▶ Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Waiting for a complete request line
    Initialized,
    /// Request line parsed, consuming header lines
    ParsingHeaders,
    /// Header block finished; no further input is accepted
    Done,
}

impl fmt::Display for ParserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParserState::Initialized => "initialized",
            ParserState::ParsingHeaders => "parsing headers",
            ParserState::Done => "done",
        };
        f.write_str(name)
    }
}

/// A parsed HTTP request: request line plus headers.
///
/// Request bodies are never read. A request declaring `Content-Length` or
/// `Transfer-Encoding` is still returned as soon as its header block ends.
#[derive(Debug, Clone)]
pub struct Request {
    pub request_line: RequestLine,
    pub headers: HeaderMap,
    pub(crate) state: ParserState,
}

impl Request {
    pub fn new() -> Self {
        Self {
            request_line: RequestLine::default(),
            headers: HeaderMap::new(),
            state: ParserState::Initialized,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    pub fn method(&self) -> &str {
        &self.request_line.method
    }

    pub fn target(&self) -> &str {
        &self.request_line.target
    }

    /// Retrieves a header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}
