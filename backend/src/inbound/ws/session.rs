//! Per-connection WebSocket handler.
//!
//! Keeps WebSocket framing and heartbeats at the edge while deferring
//! application behaviour to the injected [`LocationTracker`]. The public
//! WebSocket contract pings every 5s and considers a connection idle after
//! 10s without client traffic. Tests shorten these intervals to speed up
//! feedback.
//!
//! Live tracking runs on its own task per pair and writes to a clone of the
//! connection's [`Session`], so tracking data interleaves with replies to
//! later requests. Every live stream the connection started is cancelled
//! when the loop exits.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::time;
use tracing::{Instrument, debug, info, warn};

use crate::domain::ports::LocationTracker;
use crate::domain::{Error, LiveTracking, LocationReport, MonitorHandle, TrackingPair};
use crate::inbound::http::validation::parse_username;
use crate::inbound::ws::messages::{ClientRequest, LocationData, ServerMessage, TrackingRequest};

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

pub(super) async fn handle_ws_session(
    tracker: Arc<dyn LocationTracker>,
    session: Session,
    stream: MessageStream,
) {
    WsSession::new(tracker).run(session, stream).await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    Network(Closed),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct WsSession {
    tracker: Arc<dyn LocationTracker>,
    live: HashMap<TrackingPair, MonitorHandle>,
}

impl WsSession {
    fn new(tracker: Arc<dyn LocationTracker>) -> Self {
        Self {
            tracker,
            live: HashMap::new(),
        }
    }

    async fn run(mut self, mut session: Session, mut stream: MessageStream) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message)
                        .await
                }
            };

            if let Err(error) = result {
                log_shutdown_reason(&error);
                self.cancel_live_tracking();
                close_session_if_needed(session, close_action_for(&error)).await;
                return;
            }
        }
    }

    async fn handle_stream_message(
        &mut self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };

        match message {
            Ok(message) => self.handle_message(session, last_heartbeat, message).await,
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn handle_message(
        &mut self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Message,
    ) -> Result<(), SessionError> {
        match message {
            Message::Ping(payload) => {
                *last_heartbeat = Instant::now();
                session
                    .pong(&payload)
                    .await
                    .map_err(SessionError::Network)?;
                Ok(())
            }
            Message::Text(text) => {
                *last_heartbeat = Instant::now();
                self.handle_text_message(session, text.as_ref()).await
            }
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    async fn handle_text_message(
        &mut self,
        session: &mut Session,
        text: &str,
    ) -> Result<(), SessionError> {
        let request = match serde_json::from_str::<ClientRequest>(text) {
            Ok(request) => request,
            Err(error) => {
                warn!(error = %error, "Rejected malformed WebSocket payload");
                return Err(SessionError::InvalidPayload);
            }
        };

        let (trackee_name, user_name) = request_names(&request);
        let reply = match self.execute(session, request).await {
            Ok(reply) => reply,
            Err(error) => {
                debug!(code = ?error.code(), error = %error, "WebSocket request failed");
                Some(ServerMessage::error(
                    &error,
                    trackee_name.as_deref(),
                    user_name.as_deref(),
                ))
            }
        };

        match reply {
            Some(reply) => send_json(session, &reply)
                .await
                .map_err(SessionError::Network),
            None => Ok(()),
        }
    }

    /// Run one request. `None` means the reply arrives asynchronously.
    async fn execute(
        &mut self,
        session: &Session,
        request: ClientRequest,
    ) -> Result<Option<ServerMessage>, Error> {
        let reply = match request {
            ClientRequest::Register { register_request } => {
                let username = parse_username(register_request.user_name, "UserName")?;
                let id = self
                    .tracker
                    .register_user(&username, register_request.is_trackable)
                    .await?;
                ServerMessage::RegisterId { id }
            }
            ClientRequest::GetTrackables => ServerMessage::Trackables {
                trackables: self.tracker.list_trackables().await?,
            },
            ClientRequest::StartSession { session_request } => {
                let username = parse_username(session_request.user_name, "UserName")?;
                let session_id = self.tracker.open_session(&username).await?;
                ServerMessage::SessionStarted { session_id }
            }
            ClientRequest::StopSession { session_request } => {
                let username = parse_username(session_request.user_name, "UserName")?;
                self.tracker.close_session(&username).await?;
                ServerMessage::SessionStopped {
                    user_name: username,
                }
            }
            ClientRequest::StartTracking { tracking_request } => {
                let pair = tracking_pair(tracking_request)?;
                let tracking = self.tracker.begin_tracking(pair).await?;
                self.spawn_forwarder(session, tracking);
                return Ok(None);
            }
            ClientRequest::StopTracking { tracking_request } => {
                let pair = tracking_pair(tracking_request)?;
                self.tracker.end_tracking(&pair).await?;
                self.live.remove(&pair);
                ServerMessage::TrackingStopped {
                    trackee_name: pair.trackee,
                    user_name: pair.watcher,
                }
            }
            ClientRequest::ReportLocation { location_request } => {
                let trackee = parse_username(location_request.trackee_name, "TrackeeName")?;
                let report = LocationReport {
                    longitude: location_request.longitude,
                    latitude: location_request.latitude,
                    timestamp: location_request.timestamp,
                };
                self.tracker.submit_location(&trackee, report).await?;
                ServerMessage::LocationAccepted
            }
            ClientRequest::GetSessionIds {
                session_ids_request,
            } => {
                let username = parse_username(session_ids_request.user_name, "UserName")?;
                let sessions = self.tracker.list_sessions(&username).await?;
                ServerMessage::session_ids(&sessions)
            }
            ClientRequest::GetSessionData {
                session_data_request,
            } => {
                let records = self
                    .tracker
                    .fetch_session_track(session_data_request.id)
                    .await?;
                ServerMessage::session_data(&records)
            }
        };
        Ok(Some(reply))
    }

    fn spawn_forwarder(&mut self, session: &Session, tracking: LiveTracking) {
        let pair = tracking.pair().clone();
        if let Some(previous) = self.live.insert(pair, tracking.handle()) {
            previous.cancel();
        }
        actix_web::rt::spawn(forward_tracking(session.clone(), tracking).in_current_span());
    }

    fn cancel_live_tracking(&mut self) {
        for (pair, handle) in self.live.drain() {
            debug!(%pair, "cancelling live tracking on disconnect");
            handle.cancel();
        }
    }
}

/// Push a live stream to the socket until it is cancelled or fails.
async fn forward_tracking(mut outbound: Session, tracking: LiveTracking) {
    let pair = tracking.pair().clone();
    info!(%pair, "live tracking started");

    let trackee = &pair.trackee;
    let sink = &outbound;
    let result = tracking
        .run(|record| {
            let mut sink = sink.clone();
            let message = ServerMessage::TrackingData {
                trackee_name: trackee.clone(),
                tracking_data: LocationData::from(&record),
            };
            async move {
                send_json(&mut sink, &message)
                    .await
                    .map_err(|_| Error::subscription_failure("websocket closed"))
            }
        })
        .await;

    match result {
        Ok(()) => info!(%pair, "live tracking stopped"),
        Err(error) => {
            warn!(%pair, error = %error, "live tracking failed");
            let frame = ServerMessage::error(
                &error,
                Some(pair.trackee.as_ref()),
                Some(pair.watcher.as_ref()),
            );
            if send_json(&mut outbound, &frame).await.is_err() {
                debug!(%pair, "socket closed before the failure could be reported");
            }
        }
    }
}

fn tracking_pair(request: TrackingRequest) -> Result<TrackingPair, Error> {
    let trackee = parse_username(request.trackee_name, "TrackeeName")?;
    let watcher = parse_username(request.user_name, "UserName")?;
    Ok(TrackingPair::new(trackee, watcher))
}

/// Names echoed back in an `ERROR` frame for the request.
fn request_names(request: &ClientRequest) -> (Option<String>, Option<String>) {
    match request {
        ClientRequest::Register { register_request } => {
            (None, Some(register_request.user_name.clone()))
        }
        ClientRequest::StartSession { session_request }
        | ClientRequest::StopSession { session_request } => {
            (None, Some(session_request.user_name.clone()))
        }
        ClientRequest::StartTracking { tracking_request }
        | ClientRequest::StopTracking { tracking_request } => (
            Some(tracking_request.trackee_name.clone()),
            Some(tracking_request.user_name.clone()),
        ),
        ClientRequest::ReportLocation { location_request } => {
            (Some(location_request.trackee_name.clone()), None)
        }
        ClientRequest::GetSessionIds {
            session_ids_request,
        } => (None, Some(session_ids_request.user_name.clone())),
        ClientRequest::GetTrackables | ClientRequest::GetSessionData { .. } => (None, None),
    }
}

async fn handle_heartbeat_tick(
    session: &mut Session,
    last_heartbeat: &Instant,
) -> Result<(), SessionError> {
    if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
        return Err(SessionError::HeartbeatTimeout);
    }

    session.ping(b"").await.map_err(SessionError::Network)
}

async fn send_json(session: &mut Session, payload: &ServerMessage) -> Result<(), Closed> {
    match serde_json::to_string(payload) {
        Ok(body) => session.text(body).await,
        Err(error) => {
            warn!(error = %error, "Failed to serialize WebSocket payload");
            Ok(())
        }
    }
}

fn log_shutdown_reason(error: &SessionError) {
    match error {
        SessionError::HeartbeatTimeout => {
            warn!("WebSocket heartbeat timeout; closing connection");
        }
        SessionError::Protocol(error) => {
            warn!(error = %error, "WebSocket protocol error");
        }
        SessionError::Network(error) => {
            warn!(error = %error, "WebSocket send failed; closing connection");
        }
        SessionError::InvalidPayload | SessionError::ClientClosed(_) | SessionError::StreamClosed => {
            debug!("WebSocket connection closing");
        }
    }
}

fn close_action_for(error: &SessionError) -> CloseAction {
    match error {
        SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Normal,
            description: Some("heartbeat timeout".to_owned()),
        })),
        SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Protocol,
            description: Some("protocol error".to_owned()),
        })),
        SessionError::InvalidPayload => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Policy,
            description: Some("invalid payload".to_owned()),
        })),
        SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
        SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
    }
}

async fn close_session_if_needed(session: Session, close_action: CloseAction) {
    if let CloseAction::Close(reason) = close_action {
        if let Err(error) = session.close(reason).await {
            warn!(error = %error, "Failed to close WebSocket session");
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
