//! Location tracking engine: user registry, reporting sessions, location
//! ledger and live per-watcher streams over a Redis-compatible store.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::RequestSpan;
