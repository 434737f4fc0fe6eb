//! HTTP inbound adapter exposing the RPC surface.
//!
//! JSON bodies use camelCase. Live tracking and bulk location upload use
//! newline-delimited JSON so both directions can stream.

pub mod error;
pub mod health;
pub mod locations;
pub mod sessions;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod tracking;
pub mod users;
pub(crate) mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register the `/api/v1` scope. Callers provide `web::Data<HttpState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(users::register_user)
            .service(users::list_trackables)
            .service(sessions::start_session)
            .service(sessions::stop_session)
            .service(sessions::list_sessions)
            .service(sessions::session_locations)
            .service(tracking::start_tracking)
            .service(tracking::stop_tracking)
            .service(locations::submit_locations),
    );
}
