//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **store**: Redis-backed and in-memory implementations of the
//!   `StoreGateway` port.
//!
//! Adapters translate between store primitives and their backing
//! representation. They contain no business logic.

pub mod store;
