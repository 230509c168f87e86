//! parley-core
//!
//! Wire vocabulary shared by the relay and its clients: upstream and
//! downstream event types, feedback validation, and the downstream
//! event-stream frame codec. No HTTP dependency.

pub mod error;
pub mod feedback;
pub mod models;
pub mod sse;
