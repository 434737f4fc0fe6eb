//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use mockable::DefaultClock;

use crate::domain::LocationTrackerService;
use crate::domain::ports::LocationTracker;
use crate::inbound::http::configure;
use crate::inbound::http::state::HttpState;
use crate::outbound::store::InMemoryStoreGateway;

/// App exposing the `/api/v1` scope over `tracker`.
pub fn test_app(
    tracker: Arc<dyn LocationTracker>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(HttpState::new(tracker)))
        .configure(configure)
}

/// Tracker service over a fresh in-memory store.
pub fn in_memory_tracker() -> Arc<LocationTrackerService> {
    Arc::new(LocationTrackerService::new(
        Arc::new(InMemoryStoreGateway::new()),
        Arc::new(DefaultClock),
    ))
}
