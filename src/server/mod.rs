//! Connection acceptance and dispatch.

pub mod listener;

pub use crate::http::handler::{BodyWriter, Handler, HandlerError};
pub use listener::Server;
