//! Shared WebSocket adapter state.

use std::sync::Arc;

use crate::domain::ports::LocationTracker;

/// Dependency bundle for the `/ws` endpoint and its session loops.
#[derive(Clone)]
pub struct WsState {
    pub tracker: Arc<dyn LocationTracker>,
}

impl WsState {
    pub fn new(tracker: Arc<dyn LocationTracker>) -> Self {
        Self { tracker }
    }
}
