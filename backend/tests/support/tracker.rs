//! Shared setup for the end-to-end suites.
//!
//! Integration tests compile as separate crates, so each one pulls this in
//! with `#[path]`.

use std::sync::Arc;

use location_tracker::domain::LocationTrackerService;
use location_tracker::outbound::store::InMemoryStoreGateway;
use mockable::DefaultClock;

/// Tracker service over a fresh in-process store.
pub fn in_memory_tracker() -> Arc<LocationTrackerService> {
    Arc::new(LocationTrackerService::new(
        Arc::new(InMemoryStoreGateway::new()),
        Arc::new(DefaultClock),
    ))
}
