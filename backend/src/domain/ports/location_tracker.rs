//! Driving port exposed to the transport adapters.

use async_trait::async_trait;

use crate::domain::{
    Error, LiveTracking, LocationRecord, LocationReport, SessionId, SessionSummary, TrackingPair,
    UserId, Username,
};

/// Location tracking use-cases shared by the HTTP and WebSocket adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationTracker: Send + Sync {
    /// Register a new user.
    async fn register_user(&self, username: &Username, trackable: bool) -> Result<UserId, Error>;

    /// Usernames of trackable users in registration order.
    async fn list_trackables(&self) -> Result<Vec<Username>, Error>;

    /// Start a new current session for the user.
    async fn open_session(&self, username: &Username) -> Result<SessionId, Error>;

    /// Clear the user's current session.
    async fn close_session(&self, username: &Username) -> Result<(), Error>;

    /// Establish the watcher edge and open a live stream of the trackee's locations.
    ///
    /// Any live stream already open for the same pair is cancelled first.
    async fn begin_tracking(&self, pair: TrackingPair) -> Result<LiveTracking, Error>;

    /// Cancel the live stream for the pair, if any, and remove the watcher edge.
    async fn end_tracking(&self, pair: &TrackingPair) -> Result<(), Error>;

    /// Record a location in the trackee's current session and notify watchers.
    async fn submit_location(
        &self,
        trackee: &Username,
        report: LocationReport,
    ) -> Result<LocationRecord, Error>;

    /// Session history of a user, oldest first.
    async fn list_sessions(&self, username: &Username) -> Result<Vec<SessionSummary>, Error>;

    /// Locations recorded in a session, in append order.
    async fn fetch_session_track(&self, session_id: SessionId)
    -> Result<Vec<LocationRecord>, Error>;
}
