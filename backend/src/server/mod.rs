//! Listener construction and dependency wiring.
//!
//! The RPC and WebSocket surfaces run as two independent Actix servers over
//! one shared [`LocationTracker`]. Both expose the health probes.

mod config;

pub use config::ServerSettings;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use color_eyre::eyre::{Result, WrapErr};
use mockable::DefaultClock;
use tracing::{info, warn};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use location_tracker::RequestSpan;
#[cfg(debug_assertions)]
use location_tracker::doc::ApiDoc;
use location_tracker::domain::LocationTrackerService;
use location_tracker::domain::ports::{LocationTracker, StoreGateway};
use location_tracker::inbound::http::health::{HealthState, live, ready};
use location_tracker::inbound::http::state::HttpState;
use location_tracker::inbound::http::{self as rpc};
use location_tracker::inbound::ws;
use location_tracker::inbound::ws::state::WsState;
use location_tracker::outbound::store::{InMemoryStoreGateway, RedisStoreGateway};

/// Build the tracker over Redis when configured, otherwise in-process.
///
/// # Errors
/// Fails when the Redis pool cannot be created.
pub async fn build_tracker(settings: &ServerSettings) -> Result<Arc<dyn LocationTracker>> {
    let store: Arc<dyn StoreGateway> = match settings.redis_pool() {
        Some(pool) => {
            let gateway = RedisStoreGateway::connect(pool)
                .await
                .wrap_err("failed to connect to redis")?;
            info!("using redis store");
            Arc::new(gateway)
        }
        None => {
            warn!("TRACKER_REDIS_URL not set; state is kept in process memory");
            Arc::new(InMemoryStoreGateway::new())
        }
    };
    Ok(Arc::new(LocationTrackerService::new(
        store,
        Arc::new(DefaultClock),
    )))
}

fn rpc_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(RequestSpan)
        .configure(rpc::configure)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct the HTTP + NDJSON listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_rpc_server(
    health_state: web::Data<HealthState>,
    tracker: Arc<dyn LocationTracker>,
    bind: (&str, u16),
) -> std::io::Result<Server> {
    let http_state = web::Data::new(HttpState::new(tracker));
    let server = HttpServer::new(move || rpc_app(health_state.clone(), http_state.clone()))
        .bind(bind)?
        .run();
    info!(host = bind.0, port = bind.1, "rpc listener bound");
    Ok(server)
}

/// Construct the WebSocket listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_ws_server(
    health_state: web::Data<HealthState>,
    tracker: Arc<dyn LocationTracker>,
    bind: (&str, u16),
) -> std::io::Result<Server> {
    let ws_state = web::Data::new(WsState::new(tracker));
    let server = HttpServer::new(move || {
        App::new()
            .app_data(health_state.clone())
            .app_data(ws_state.clone())
            .wrap(RequestSpan)
            .service(ws::ws_entry)
            .service(ready)
            .service(live)
    })
    .bind(bind)?
    .run();
    info!(host = bind.0, port = bind.1, "websocket listener bound");
    Ok(server)
}
