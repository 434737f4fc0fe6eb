//! Registry of live-tracking streams keyed by `(trackee, watcher)`.
//!
//! At most one stream serves a pair. Installing a new stream cancels the
//! previous one; the lease returned to each stream removes only its own
//! entry when dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::domain::{MonitorHandle, TrackingPair};

type Entries = HashMap<TrackingPair, MonitorHandle>;

/// Shared map from tracking pair to the cancel handle serving it.
#[derive(Debug, Clone, Default)]
pub struct TrackingRegistry {
    entries: Arc<Mutex<Entries>>,
}

impl TrackingRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handle` for `pair`, cancelling any stream it replaces.
    pub fn install(&self, pair: TrackingPair, handle: MonitorHandle) -> TrackingLease {
        let handle_id = handle.id();
        if let Some(previous) = self.entries().insert(pair.clone(), handle) {
            debug!(pair = %pair, handle_id = previous.id(), "replaced live tracking");
            previous.cancel();
        }
        TrackingLease {
            registry: self.clone(),
            pair,
            handle_id,
        }
    }

    /// Cancel and forget the stream serving `pair`. Returns whether one existed.
    pub fn cancel(&self, pair: &TrackingPair) -> bool {
        let Some(handle) = self.entries().remove(pair) else {
            return false;
        };
        handle.cancel();
        true
    }

    #[must_use]
    pub fn is_tracking(&self, pair: &TrackingPair) -> bool {
        self.entries().contains_key(pair)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, pair: &TrackingPair, handle_id: u64) {
        let mut entries = self.entries();
        if entries.get(pair).is_some_and(|handle| handle.id() == handle_id) {
            entries.remove(pair);
        }
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        // Every mutation is a single map call, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Ownership token for one registry entry; dropping it frees the entry
/// unless a newer stream has taken the pair over.
#[derive(Debug)]
pub struct TrackingLease {
    registry: TrackingRegistry,
    pair: TrackingPair,
    handle_id: u64,
}

impl TrackingLease {
    #[must_use]
    pub fn pair(&self) -> &TrackingPair {
        &self.pair
    }
}

impl Drop for TrackingLease {
    fn drop(&mut self) {
        self.registry.release(&self.pair, self.handle_id);
    }
}
