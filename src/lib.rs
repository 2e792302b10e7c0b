//! httpfromtcp - an HTTP/1.1 server written directly against TCP byte streams.
//!
//! Core library: header map, incremental request parser, ordered response
//! writer and the concurrent accept loop.

pub mod config;
pub mod http;
pub mod server;
