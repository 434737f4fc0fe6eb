//! Live-tracking handlers.
//!
//! ```text
//! POST   /api/v1/tracking/{trackee}/{watcher}   application/x-ndjson stream
//! DELETE /api/v1/tracking/{trackee}/{watcher}
//! ```
//!
//! The stream carries one JSON object per line. It ends after `end_tracking`
//! for the pair, a replacing `POST` for the pair, or a terminal failure, in
//! which case the last line is `{"error": {...}}`. Dropping the connection
//! cancels the subscription.

use actix_web::web::Bytes;
use actix_web::{HttpResponse, delete, post, web};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, LocationRecord, TrackingPair, Username};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::redact_if_internal;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_username;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// One streamed location of the trackee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingDataLine {
    pub trackee_name: Username,
    pub longitude: f64,
    pub latitude: f64,
    pub timestamp: i64,
}

impl TrackingDataLine {
    fn new(trackee_name: Username, record: &LocationRecord) -> Self {
        Self {
            trackee_name,
            longitude: record.longitude,
            latitude: record.latitude,
            timestamp: record.timestamp,
        }
    }
}

/// Final line of a stream that ended abnormally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrackingErrorLine {
    pub error: Error,
}

fn tracking_pair(path: web::Path<(String, String)>) -> Result<TrackingPair, Error> {
    let (trackee, watcher) = path.into_inner();
    Ok(TrackingPair::new(
        parse_username(trackee, "trackee")?,
        parse_username(watcher, "watcher")?,
    ))
}

fn ndjson_line<T: Serialize>(value: &T) -> Result<Bytes, serde_json::Error> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    Ok(Bytes::from(line))
}

/// Start tracking and stream the trackee's locations as NDJSON.
#[utoipa::path(
    post,
    path = "/api/v1/tracking/{trackee}/{watcher}",
    params(
        ("trackee" = String, Path, description = "User being tracked"),
        ("watcher" = String, Path, description = "User receiving locations")
    ),
    responses(
        (status = 200, description = "NDJSON stream of locations", body = TrackingDataLine, content_type = "application/x-ndjson"),
        (status = 403, description = "Trackee is not trackable", body = Error),
        (status = 404, description = "Unknown user", body = Error),
        (status = 503, description = "Store or subscription unavailable", body = Error)
    ),
    tags = ["tracking"],
    operation_id = "startTracking"
)]
#[post("/tracking/{trackee}/{watcher}")]
pub async fn start_tracking(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let pair = tracking_pair(path)?;
    let tracking = state.tracker.begin_tracking(pair).await?;
    let trackee = tracking.pair().trackee.clone();

    let body = tracking.into_stream().map(move |item| match item {
        Ok(record) => ndjson_line(&TrackingDataLine::new(trackee.clone(), &record)),
        Err(error) => ndjson_line(&TrackingErrorLine {
            error: redact_if_internal(&error),
        }),
    });
    Ok(HttpResponse::Ok()
        .content_type(NDJSON_CONTENT_TYPE)
        .streaming(body))
}

/// Stop tracking: ends any open stream for the pair and removes the edge.
#[utoipa::path(
    delete,
    path = "/api/v1/tracking/{trackee}/{watcher}",
    params(
        ("trackee" = String, Path, description = "User being tracked"),
        ("watcher" = String, Path, description = "User receiving locations")
    ),
    responses(
        (status = 204, description = "Tracking stopped"),
        (status = 400, description = "Invalid username", body = Error)
    ),
    tags = ["tracking"],
    operation_id = "stopTracking"
)]
#[delete("/tracking/{trackee}/{watcher}")]
pub async fn stop_tracking(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let pair = tracking_pair(path)?;
    state.tracker.end_tracking(&pair).await?;
    Ok(HttpResponse::NoContent().finish())
}
