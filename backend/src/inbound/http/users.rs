//! User registration handlers.
//!
//! ```text
//! POST /api/v1/users {"userName":"alice","trackable":true}
//! GET /api/v1/trackables
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, UserId, Username};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_username;

/// Request body for `POST /api/v1/users`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub user_name: String,
    #[serde(default)]
    pub trackable: bool,
}

/// Response body carrying the allocated id.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserResponse {
    pub user_id: UserId,
}

/// Trackable usernames in registration order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackablesResponse {
    pub user_names: Vec<Username>,
}

/// Register a user.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterUserResponse),
        (status = 400, description = "Invalid username", body = Error),
        (status = 409, description = "Username taken", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "registerUser"
)]
#[post("/users")]
pub async fn register_user(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterUserRequest>,
) -> ApiResult<HttpResponse> {
    let RegisterUserRequest {
        user_name,
        trackable,
    } = payload.into_inner();
    let username = parse_username(user_name, "userName")?;
    let user_id = state.tracker.register_user(&username, trackable).await?;
    Ok(HttpResponse::Created().json(RegisterUserResponse { user_id }))
}

/// List users that accept watchers.
#[utoipa::path(
    get,
    path = "/api/v1/trackables",
    responses(
        (status = 200, description = "Trackable users", body = TrackablesResponse),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "listTrackables"
)]
#[get("/trackables")]
pub async fn list_trackables(state: web::Data<HttpState>) -> ApiResult<web::Json<TrackablesResponse>> {
    let user_names = state.tracker.list_trackables().await?;
    Ok(web::Json(TrackablesResponse { user_names }))
}
