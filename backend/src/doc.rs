//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] describes the RPC listener: registration, sessions, live
//! tracking, location ingestion and health probes. NDJSON endpoints
//! document the schema of a single line. The WebSocket envelope protocol is
//! not part of the document.

use utoipa::OpenApi;

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::tracking::TrackingErrorLine;

/// OpenAPI document for the RPC listener.
/// Swagger UI serves it in debug builds only.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Location tracker API",
        description = "Users, sessions and live location streams over HTTP and NDJSON."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::users::register_user,
        crate::inbound::http::users::list_trackables,
        crate::inbound::http::sessions::start_session,
        crate::inbound::http::sessions::stop_session,
        crate::inbound::http::sessions::list_sessions,
        crate::inbound::http::sessions::session_locations,
        crate::inbound::http::tracking::start_tracking,
        crate::inbound::http::tracking::stop_tracking,
        crate::inbound::http::locations::submit_locations,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(Error, ErrorCode, TrackingErrorLine)),
    tags(
        (name = "users", description = "Registration and trackable discovery"),
        (name = "sessions", description = "Reporting sessions and their history"),
        (name = "tracking", description = "Live tracking and location ingestion"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
