//! Domain primitives, managers and ports.
//!
//! Purpose: hold the location-tracking rules independent of transport and
//! storage. Managers talk to the store only through [`ports::StoreGateway`];
//! transports talk to the domain only through [`ports::LocationTracker`].
//!
//! Public surface:
//! - Error / ErrorCode: typed failures shared by every layer.
//! - Username, UserId, SessionId, LocationId, LocationKey: identifiers.
//! - LocationReport, LocationRecord, SessionSummary: location data.
//! - TrackingPair, TrackingRelationship: tracking edges.
//! - LocationTrackerService: the driving port implementation.
//! - LiveTracking, LocationSubscription, MonitorHandle: live streams.

pub mod error;
pub mod identity;
pub(crate) mod keys;
pub mod ledger;
pub mod live_tracking;
pub mod location;
pub mod monitor;
pub mod ports;
pub mod registry;
pub mod sessions;
#[cfg(test)]
pub(crate) mod test_support;
pub mod tracker_service;
pub mod tracking;
pub mod tracking_manager;
pub mod user;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::IdentityRegistry;
pub use self::ledger::LocationLedger;
pub use self::live_tracking::LiveTracking;
pub use self::location::{
    LocationId, LocationKey, LocationKeyError, LocationRecord, LocationReport, SessionId,
    SessionSummary,
};
pub use self::monitor::{LiveMonitor, LocationSubscription, MonitorHandle};
pub use self::registry::{TrackingLease, TrackingRegistry};
pub use self::sessions::SessionManager;
pub use self::tracker_service::LocationTrackerService;
pub use self::tracking::{TrackingPair, TrackingRelationship};
pub use self::tracking_manager::TrackingManager;
pub use self::user::{USERNAME_MAX, UserId, UserValidationError, Username};
