//! Location and session records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::user::numeric_id;

numeric_id! {
    /// Identifier allocated from the `next_session_id` counter.
    SessionId
}

numeric_id! {
    /// Identifier allocated from the `next_location_id` counter.
    LocationId
}

const LOCATION_KEY_PREFIX: &str = "location:";

/// Store key of a location record; also the payload of a notification.
///
/// # Examples
/// ```
/// use location_tracker::domain::{LocationId, LocationKey};
///
/// let key: LocationKey = "location:7".parse().expect("valid key");
/// assert_eq!(key.id(), LocationId::new(7));
/// assert_eq!(key.to_string(), "location:7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationKey(LocationId);

/// Raised when a notification payload is not a location key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed location key: {0}")]
pub struct LocationKeyError(pub String);

impl LocationKey {
    #[must_use]
    pub const fn for_id(id: LocationId) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(self) -> LocationId {
        self.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{LOCATION_KEY_PREFIX}{}", self.0)
    }
}

impl FromStr for LocationKey {
    type Err = LocationKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(LOCATION_KEY_PREFIX)
            .and_then(|raw| raw.parse::<LocationId>().ok())
            .map(Self)
            .ok_or_else(|| LocationKeyError(s.to_owned()))
    }
}

/// A single position submitted by a trackee.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationReport {
    pub longitude: f64,
    pub latitude: f64,
    /// Client-supplied timestamp, stored verbatim.
    pub timestamp: i64,
}

/// An immutable stored location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub id: LocationId,
    pub session_id: SessionId,
    pub longitude: f64,
    pub latitude: f64,
    pub timestamp: i64,
}

impl LocationRecord {
    /// The position fields as originally reported.
    #[must_use]
    pub fn report(&self) -> LocationReport {
        LocationReport {
            longitude: self.longitude,
            latitude: self.latitude,
            timestamp: self.timestamp,
        }
    }
}

/// Entry of a user's session history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: SessionId,
    /// Unix seconds at which the session started.
    pub started_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("location:")]
    #[case("location:abc")]
    #[case("session:4")]
    #[case("4")]
    fn rejects_malformed_keys(#[case] raw: &str) {
        assert_eq!(
            raw.parse::<LocationKey>(),
            Err(LocationKeyError(raw.to_owned()))
        );
    }

    #[rstest]
    fn key_display_matches_store_layout() {
        let key = LocationKey::for_id(LocationId::new(12));
        assert_eq!(key.to_string(), "location:12");
        assert_eq!(key.to_string().parse::<LocationKey>(), Ok(key));
    }
}
