//! parley-orchestrator
//!
//! HTTP client for the external orchestrator service: the streaming
//! answer call, its line framing, translation into downstream events,
//! and feedback forwarding.

pub mod client;
pub mod config;
pub mod error;
pub mod feedback;
pub mod lines;
pub mod stream;
pub mod translate;
