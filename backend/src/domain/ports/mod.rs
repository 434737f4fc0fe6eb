//! Domain ports for the hexagonal boundary.
//!
//! - [`StoreGateway`] is driven by the domain and implemented by the
//!   outbound store adapters.
//! - [`LocationTracker`] drives the domain and is consumed by the inbound
//!   transport adapters.

mod location_tracker;
mod store_gateway;

#[cfg(test)]
pub use location_tracker::MockLocationTracker;
pub use location_tracker::LocationTracker;
#[cfg(test)]
pub use store_gateway::MockStoreGateway;
pub use store_gateway::{NotificationStream, StoreError, StoreGateway};
