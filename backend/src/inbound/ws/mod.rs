//! WebSocket inbound adapter.
//!
//! Responsibilities:
//! - upgrade `GET /ws` and run one session loop per connection
//! - translate envelope frames into [`LocationTracker`] calls
//! - push live tracking data to the watcher's socket
//!
//! [`LocationTracker`]: crate::domain::ports::LocationTracker

use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use tracing::{Instrument, error, info_span};
use uuid::Uuid;

mod session;

pub mod messages;
pub mod state;

/// Handle WebSocket upgrade for the `/ws` endpoint.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<state::WsState>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let (response, session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        error
    })?;

    let span = info_span!("ws_connection", connection_id = %Uuid::new_v4());
    actix_web::rt::spawn(
        session::handle_ws_session(state.tracker.clone(), session, messages).instrument(span),
    );
    Ok(response)
}
