//! Wire-level message definitions for the WebSocket adapter.
//!
//! Every frame is a JSON object. Requests carry a `RequestType`
//! discriminator plus one payload object named after its type; responses
//! carry a `ResponseType` discriminator.
//!
//! ```text
//! {"RequestType":"START_SESSION","SessionRequest":{"UserName":"alice"}}
//! {"ResponseType":"SESSION_STARTED","SessionId":1}
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{
    Error, ErrorCode, LocationId, LocationRecord, LocationReport, SessionId, SessionSummary, UserId,
    Username,
};
use crate::inbound::http::error::redact_if_internal;

/// Inbound request envelope.
#[derive(Debug, Deserialize, Serialize)]
#[serde(
    tag = "RequestType",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "PascalCase"
)]
pub enum ClientRequest {
    Register { register_request: RegisterRequest },
    GetTrackables,
    StartSession { session_request: SessionRequest },
    StopSession { session_request: SessionRequest },
    StartTracking { tracking_request: TrackingRequest },
    StopTracking { tracking_request: TrackingRequest },
    ReportLocation { location_request: LocationRequest },
    GetSessionIds { session_ids_request: SessionIdsRequest },
    GetSessionData { session_data_request: SessionDataRequest },
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterRequest {
    pub user_name: String,
    #[serde(default)]
    pub is_trackable: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionRequest {
    pub user_name: String,
}

/// Watcher `UserName` asking to follow `TrackeeName`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrackingRequest {
    pub trackee_name: String,
    pub user_name: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocationRequest {
    pub trackee_name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub timestamp: i64,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionIdsRequest {
    pub user_name: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionDataRequest {
    pub id: SessionId,
}

/// A single position as sent to clients.
///
/// `Id` is present whenever the position has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<LocationId>,
    pub longitude: f64,
    pub latitude: f64,
    pub timestamp: i64,
}

impl From<LocationReport> for LocationData {
    fn from(value: LocationReport) -> Self {
        Self {
            id: None,
            longitude: value.longitude,
            latitude: value.latitude,
            timestamp: value.timestamp,
        }
    }
}

impl From<&LocationRecord> for LocationData {
    fn from(value: &LocationRecord) -> Self {
        Self {
            id: Some(value.id),
            ..value.report().into()
        }
    }
}

/// One entry of a user's session history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionEntry {
    pub id: SessionId,
    /// Unix seconds at which the session started.
    pub timestamp: i64,
}

impl From<&SessionSummary> for SessionEntry {
    fn from(value: &SessionSummary) -> Self {
        Self {
            id: value.session_id,
            timestamp: value.started_at,
        }
    }
}

/// Outbound response envelope.
#[derive(Debug, Deserialize, Serialize)]
#[serde(
    tag = "ResponseType",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "PascalCase"
)]
pub enum ServerMessage {
    RegisterId {
        id: UserId,
    },
    Trackables {
        trackables: Vec<Username>,
    },
    SessionStarted {
        session_id: SessionId,
    },
    SessionStopped {
        user_name: Username,
    },
    TrackingData {
        trackee_name: Username,
        tracking_data: LocationData,
    },
    TrackingStopped {
        trackee_name: Username,
        user_name: Username,
    },
    LocationAccepted,
    SessionIds {
        ids: Vec<SessionEntry>,
    },
    SessionData {
        data: Vec<LocationData>,
    },
    Error {
        code: ErrorCode,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trackee_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_name: Option<String>,
    },
}

impl ServerMessage {
    pub fn session_ids(sessions: &[SessionSummary]) -> Self {
        Self::SessionIds {
            ids: sessions.iter().map(SessionEntry::from).collect(),
        }
    }

    pub fn session_data(records: &[LocationRecord]) -> Self {
        Self::SessionData {
            data: records.iter().map(LocationData::from).collect(),
        }
    }

    /// Error frame tagged with the names the failed request referred to.
    ///
    /// Internal failures are redacted the same way the HTTP adapter does.
    pub fn error(error: &Error, trackee_name: Option<&str>, user_name: Option<&str>) -> Self {
        let error = redact_if_internal(error);
        Self::Error {
            code: error.code(),
            message: error.message().to_owned(),
            trackee_name: trackee_name.map(str::to_owned),
            user_name: user_name.map(str::to_owned),
        }
    }
}
