//! Session lifecycle and history handlers.
//!
//! ```text
//! POST   /api/v1/users/{userName}/session
//! DELETE /api/v1/users/{userName}/session
//! GET    /api/v1/users/{userName}/sessions
//! GET    /api/v1/sessions/{sessionId}/locations
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, LocationRecord, SessionId, SessionSummary};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_session_id, parse_username};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartedResponse {
    pub session_id: SessionId,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingDataResponse {
    pub tracking_data: Vec<LocationRecord>,
}

/// Start a new current session; later reports are appended to it.
#[utoipa::path(
    post,
    path = "/api/v1/users/{userName}/session",
    params(("userName" = String, Path, description = "Registered username")),
    responses(
        (status = 201, description = "Session started", body = SessionStartedResponse),
        (status = 404, description = "Unknown user", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "startSession"
)]
#[post("/users/{user_name}/session")]
pub async fn start_session(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let username = parse_username(path.into_inner(), "userName")?;
    let session_id = state.tracker.open_session(&username).await?;
    Ok(HttpResponse::Created().json(SessionStartedResponse { session_id }))
}

/// Clear the current session; history is kept.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{userName}/session",
    params(("userName" = String, Path, description = "Registered username")),
    responses(
        (status = 204, description = "Session stopped"),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "stopSession"
)]
#[delete("/users/{user_name}/session")]
pub async fn stop_session(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let username = parse_username(path.into_inner(), "userName")?;
    state.tracker.close_session(&username).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Session history, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/users/{userName}/sessions",
    params(("userName" = String, Path, description = "Registered username")),
    responses(
        (status = 200, description = "Session history", body = SessionsResponse),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "listSessions"
)]
#[get("/users/{user_name}/sessions")]
pub async fn list_sessions(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<SessionsResponse>> {
    let username = parse_username(path.into_inner(), "userName")?;
    let sessions = state.tracker.list_sessions(&username).await?;
    Ok(web::Json(SessionsResponse { sessions }))
}

/// Locations recorded in a session, in append order.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{sessionId}/locations",
    params(("sessionId" = i64, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Recorded locations", body = TrackingDataResponse),
        (status = 400, description = "Malformed session id", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "getSessionLocations"
)]
#[get("/sessions/{session_id}/locations")]
pub async fn session_locations(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<TrackingDataResponse>> {
    let session_id = parse_session_id(&path.into_inner())?;
    let tracking_data = state.tracker.fetch_session_track(session_id).await?;
    Ok(web::Json(TrackingDataResponse { tracking_data }))
}
