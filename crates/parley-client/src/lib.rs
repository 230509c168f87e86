//! parley-client library root.
//!
//! Consumes the relay's event stream and keeps the chat state a UI renders:
//! message list, status line, and the typewriter reveal of the latest
//! answer. The `parley-chat` binary is a terminal front end over it.

pub mod config;
pub mod consumer;
pub mod error;
pub mod models;
pub mod reveal;
pub mod session;
pub mod stream;
