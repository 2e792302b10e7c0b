//! HTTP/1.1 protocol machinery built directly on byte streams.
//!
//! # Architecture
//!
//! - **`headers`**: case-insensitive header map and the header-line parser
//! - **`request`**: request line, request and parser state types
//! - **`parser`**: incremental request parser fed from an `AsyncRead`
//! - **`response`**: status codes and the default response headers
//! - **`writer`**: ordered response serialization, including chunked bodies and trailers
//! - **`handler`**: the contract between a connection and application code
//! - **`connection`**: one request/response cycle over an accepted stream
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Parse request line + headers
//!        └──────┬──────┘
//!               ├─ parse error ──────────────┐
//!               ▼                            │
//!        ┌──────────────────┐                │
//!        │    Handling      │ ← Run handler  │
//!        └──────┬───────────┘                │
//!               ▼                            ▼
//!        ┌──────────────────┐   400 / handler error / 200
//!        │   Responding     │ ← Status line → headers → body
//!        └──────┬───────────┘
//!               ▼
//!            Closed
//! ```
//!
//! There is no keep-alive: every connection is closed after one response.
//! Request bodies are not read.

pub mod connection;
pub mod handler;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
