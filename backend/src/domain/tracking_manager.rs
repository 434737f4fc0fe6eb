//! Tracking relationship manager.
//!
//! Edges live in `tracked:{trackee id}` as sorted-set members keyed by
//! watcher id and scored by the time they were (re)established. Both start
//! and stop take the trackee first.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::ports::StoreGateway;
use crate::domain::{Error, IdentityRegistry, TrackingRelationship, Username, keys};

/// Creates and removes watcher→trackee edges.
#[derive(Clone)]
pub struct TrackingManager {
    store: Arc<dyn StoreGateway>,
    identity: IdentityRegistry,
    clock: Arc<dyn Clock>,
}

impl TrackingManager {
    /// Create a tracking manager.
    pub fn new(
        store: Arc<dyn StoreGateway>,
        identity: IdentityRegistry,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            identity,
            clock,
        }
    }

    /// Create or refresh the edge; the trackee must be trackable.
    pub async fn start_tracking(&self, trackee: &Username, watcher: &Username) -> Result<(), Error> {
        let trackee_id = self.identity.resolve(trackee).await?;
        let watcher_id = self.identity.resolve(watcher).await?;
        if !self.identity.is_trackable(trackee_id).await? {
            return Err(Error::not_trackable(trackee));
        }

        self.store
            .zadd(
                &keys::tracked(trackee_id),
                &watcher_id.to_string(),
                self.clock.utc().timestamp(),
            )
            .await?;
        info!(trackee = %trackee, watcher = %watcher, "tracking edge established");
        Ok(())
    }

    /// Remove the edge when present; unknown users and missing edges are no-ops.
    pub async fn stop_tracking(&self, trackee: &Username, watcher: &Username) -> Result<(), Error> {
        let Some(trackee_id) = self.identity.lookup(trackee).await? else {
            return Ok(());
        };
        let Some(watcher_id) = self.identity.lookup(watcher).await? else {
            return Ok(());
        };

        self.store
            .zrem(&keys::tracked(trackee_id), &watcher_id.to_string())
            .await?;
        info!(trackee = %trackee, watcher = %watcher, "tracking edge removed");
        Ok(())
    }

    /// Current watcher edges of a trackee, oldest first.
    pub async fn watchers(&self, trackee: &Username) -> Result<Vec<TrackingRelationship>, Error> {
        let trackee_id = self.identity.resolve(trackee).await?;
        self.store
            .zrange_with_scores(&keys::tracked(trackee_id))
            .await?
            .into_iter()
            .map(|(member, established_at)| -> Result<TrackingRelationship, Error> {
                Ok(TrackingRelationship {
                    trackee: trackee_id,
                    watcher: keys::parse_stored(&member, "watcher id")?,
                    established_at,
                })
            })
            .collect()
    }
}
