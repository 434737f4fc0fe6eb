//! Streaming location submission.
//!
//! ```text
//! POST /api/v1/locations   application/x-ndjson
//! {"trackeeName":"alice","longitude":-122.4,"latitude":37.7,"timestamp":1000}
//! ```
//!
//! Lines are processed as they arrive, so a long-lived upload reports
//! locations in real time. The first failing line aborts the request, as
//! does a line longer than [`MAX_LINE_BYTES`].

use actix_web::web::BytesMut;
use actix_web::{post, web};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::{Error, LocationReport};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_username;

/// Longest line accepted before the upload is rejected.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// One line of the upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationLine {
    pub trackee_name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub timestamp: i64,
}

/// Number of locations recorded by the upload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationsAccepted {
    pub accepted: u64,
}

async fn submit_line(state: &HttpState, line_number: u64, raw: &[u8]) -> Result<(), Error> {
    let line: LocationLine = serde_json::from_slice(raw).map_err(|err| {
        warn!(line = line_number, error = %err, "rejected location line");
        Error::invalid_request(format!("line {line_number} is not a location: {err}"))
            .with_details(json!({ "line": line_number, "code": "invalid_location" }))
    })?;
    let trackee = parse_username(line.trackee_name, "trackeeName")?;
    let report = LocationReport {
        longitude: line.longitude,
        latitude: line.latitude,
        timestamp: line.timestamp,
    };
    state.tracker.submit_location(&trackee, report).await?;
    Ok(())
}

fn line_too_long(line_number: u64) -> Error {
    warn!(line = line_number, limit = MAX_LINE_BYTES, "rejected oversized location line");
    Error::invalid_request(format!(
        "line {line_number} exceeds {MAX_LINE_BYTES} bytes"
    ))
    .with_details(json!({ "line": line_number, "code": "line_too_long" }))
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Record each NDJSON line in the body as a location report.
#[utoipa::path(
    post,
    path = "/api/v1/locations",
    request_body(content = LocationLine, content_type = "application/x-ndjson"),
    responses(
        (status = 200, description = "All lines recorded", body = LocationsAccepted),
        (status = 400, description = "Malformed or oversized line", body = Error),
        (status = 404, description = "Unknown trackee", body = Error),
        (status = 409, description = "Trackee has no active session", body = Error)
    ),
    tags = ["tracking"],
    operation_id = "submitLocations"
)]
#[post("/locations")]
pub async fn submit_locations(
    state: web::Data<HttpState>,
    mut payload: web::Payload,
) -> ApiResult<web::Json<LocationsAccepted>> {
    let mut buffer = BytesMut::new();
    let mut accepted = 0_u64;
    let mut line_number = 0_u64;

    loop {
        let chunk = payload.next().await;
        let finished = chunk.is_none();
        if let Some(chunk) = chunk {
            let chunk = chunk.map_err(|err| {
                Error::invalid_request(format!("request body could not be read: {err}"))
            })?;
            buffer.extend_from_slice(&chunk);
        }

        while let Some(end) = buffer.iter().position(|byte| *byte == b'\n') {
            let line = buffer.split_to(end + 1);
            line_number += 1;
            if !is_blank(&line) {
                submit_line(&state, line_number, &line).await?;
                accepted += 1;
            }
        }

        if buffer.len() > MAX_LINE_BYTES {
            return Err(line_too_long(line_number + 1));
        }

        if finished {
            if !is_blank(&buffer) {
                line_number += 1;
                submit_line(&state, line_number, &buffer).await?;
                accepted += 1;
            }
            return Ok(web::Json(LocationsAccepted { accepted }));
        }
    }
}
