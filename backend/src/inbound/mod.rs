//! Inbound adapters that translate external requests into
//! [`LocationTracker`](crate::domain::ports::LocationTracker) calls while
//! keeping framework details at the edge.
//!
//! [`http`] serves the RPC surface (JSON plus NDJSON streams); [`ws`] serves
//! the WebSocket envelope protocol.

pub mod http;
pub mod ws;
