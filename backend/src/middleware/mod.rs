//! Request middleware shared by the RPC and WebSocket listeners.

pub mod request_span;

pub use request_span::RequestSpan;
