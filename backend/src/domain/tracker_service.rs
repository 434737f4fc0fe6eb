//! Location tracker service implementing the driving port.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{LocationTracker, StoreGateway};
use crate::domain::{
    Error, IdentityRegistry, LiveMonitor, LiveTracking, LocationLedger, LocationRecord,
    LocationReport, SessionId, SessionManager, SessionSummary, TrackingManager, TrackingPair,
    TrackingRegistry, UserId, Username,
};

/// Composes the managers over one store and owns the tracking registry
/// shared by every transport.
#[derive(Clone)]
pub struct LocationTrackerService {
    identity: IdentityRegistry,
    sessions: SessionManager,
    tracking: TrackingManager,
    ledger: LocationLedger,
    monitor: LiveMonitor,
    registry: TrackingRegistry,
}

impl LocationTrackerService {
    /// Wire the managers over `store`.
    pub fn new(store: Arc<dyn StoreGateway>, clock: Arc<dyn Clock>) -> Self {
        let identity = IdentityRegistry::new(store.clone());
        let sessions = SessionManager::new(store.clone(), identity.clone(), clock.clone());
        let tracking = TrackingManager::new(store.clone(), identity.clone(), clock);
        let ledger = LocationLedger::new(store.clone(), identity.clone(), sessions.clone());
        let monitor = LiveMonitor::new(store, ledger.clone());
        Self {
            identity,
            sessions,
            tracking,
            ledger,
            monitor,
            registry: TrackingRegistry::new(),
        }
    }

    /// Live-tracking streams currently registered.
    #[must_use]
    pub fn registry(&self) -> &TrackingRegistry {
        &self.registry
    }
}

#[async_trait]
impl LocationTracker for LocationTrackerService {
    async fn register_user(&self, username: &Username, trackable: bool) -> Result<UserId, Error> {
        self.identity.register(username, trackable).await
    }

    async fn list_trackables(&self) -> Result<Vec<Username>, Error> {
        self.identity.list_trackables().await
    }

    async fn open_session(&self, username: &Username) -> Result<SessionId, Error> {
        self.sessions.start_session(username).await
    }

    async fn close_session(&self, username: &Username) -> Result<(), Error> {
        self.sessions.stop_session(username).await
    }

    async fn begin_tracking(&self, pair: TrackingPair) -> Result<LiveTracking, Error> {
        // The previous stream for the pair keeps running until `install`
        // replaces it, so a failed restart leaves it in place.
        self.tracking
            .start_tracking(&pair.trackee, &pair.watcher)
            .await?;
        let subscription = self.monitor.subscribe(pair.clone()).await?;
        let lease = self.registry.install(pair.clone(), subscription.handle());
        info!(pair = %pair, "live tracking started");
        Ok(LiveTracking::new(subscription, lease))
    }

    async fn end_tracking(&self, pair: &TrackingPair) -> Result<(), Error> {
        if self.registry.cancel(pair) {
            info!(pair = %pair, "live tracking stopped");
        }
        self.tracking
            .stop_tracking(&pair.trackee, &pair.watcher)
            .await
    }

    async fn submit_location(
        &self,
        trackee: &Username,
        report: LocationReport,
    ) -> Result<LocationRecord, Error> {
        self.ledger.report_location(trackee, report).await
    }

    async fn list_sessions(&self, username: &Username) -> Result<Vec<SessionSummary>, Error> {
        self.sessions.list_sessions(username).await
    }

    async fn fetch_session_track(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<LocationRecord>, Error> {
        self.ledger.session_data(session_id).await
    }
}

#[cfg(test)]
#[path = "tracker_service_tests.rs"]
mod tests;
