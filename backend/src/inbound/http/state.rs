//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on the driving port and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::LocationTracker;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub tracker: Arc<dyn LocationTracker>,
}

impl HttpState {
    /// Construct state from the tracker port.
    pub fn new(tracker: Arc<dyn LocationTracker>) -> Self {
        Self { tracker }
    }
}
