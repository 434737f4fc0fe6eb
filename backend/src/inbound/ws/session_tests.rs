//! WebSocket session handler tests.

use super::*;
use crate::domain::LocationTrackerService;
use crate::inbound::http::test_utils::in_memory_tracker;
use crate::inbound::ws;
use crate::inbound::ws::state::WsState;
use actix_web::{App, HttpServer, dev::ServerHandle};
use awc::{BoxedSocket, ws::Codec, ws::Frame};
use futures_util::{SinkExt, StreamExt};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

type Socket = actix_codec::Framed<BoxedSocket, Codec>;

const WAIT: Duration = Duration::from_secs(2);

struct Connected {
    socket: Socket,
    tracker: Arc<LocationTrackerService>,
    _server: ServerHandle,
}

#[fixture]
async fn connected() -> Connected {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let tracker = in_memory_tracker();
    let ws_state = WsState::new(tracker.clone());
    let server = HttpServer::new(move || {
        App::new()
            .app_data(actix_web::web::Data::new(ws_state.clone()))
            .service(ws::ws_entry)
    })
    .listen(listener)
    .expect("bind test server")
    .disable_signals()
    .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let (_resp, socket) = awc::Client::default()
        .ws(format!("http://{addr}/ws"))
        .connect()
        .await
        .expect("websocket connect");

    Connected {
        socket,
        tracker,
        _server: handle,
    }
}

async fn send(socket: &mut Socket, frame: Value) {
    socket
        .send(awc::ws::Message::Text(frame.to_string().into()))
        .await
        .expect("send text");
}

/// Next text frame as JSON, answering heartbeats on the way.
async fn next_json(socket: &mut Socket) -> Value {
    time::timeout(WAIT, async {
        loop {
            let frame = socket.next().await.expect("response frame").expect("frame");
            match frame {
                Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json"),
                Frame::Ping(payload) => socket
                    .send(awc::ws::Message::Pong(payload))
                    .await
                    .expect("pong"),
                Frame::Pong(_) => {}
                other => panic!("expected text frame, got {other:?}"),
            }
        }
    })
    .await
    .expect("frame arrives in time")
}

async fn request(socket: &mut Socket, frame: Value) -> Value {
    send(socket, frame).await;
    next_json(socket).await
}

async fn register(socket: &mut Socket, name: &str, trackable: bool) {
    let reply = request(
        socket,
        json!({
            "RequestType": "REGISTER",
            "RegisterRequest": {"UserName": name, "IsTrackable": trackable}
        }),
    )
    .await;
    assert_eq!(reply["ResponseType"], "REGISTER_ID", "{reply}");
}

fn tracking_request(request_type: &str, trackee: &str, watcher: &str) -> Value {
    json!({
        "RequestType": request_type,
        "TrackingRequest": {"TrackeeName": trackee, "UserName": watcher}
    })
}

async fn wait_until_released(tracker: &LocationTrackerService) {
    time::timeout(WAIT, async {
        while !tracker.registry().is_empty() {
            time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("live tracking released");
}

#[rstest]
#[actix_rt::test]
async fn registers_and_lists_trackables(#[future] connected: Connected) {
    let Connected { mut socket, .. } = connected.await;
    let reply = request(
        &mut socket,
        json!({
            "RequestType": "REGISTER",
            "RegisterRequest": {"UserName": "alice", "IsTrackable": true}
        }),
    )
    .await;
    assert_eq!(reply, json!({"ResponseType": "REGISTER_ID", "Id": 1}));
    register(&mut socket, "bob", false).await;

    let reply = request(&mut socket, json!({"RequestType": "GET_TRACKABLES"})).await;
    assert_eq!(
        reply,
        json!({"ResponseType": "TRACKABLES", "Trackables": ["alice"]})
    );
}

#[rstest]
#[actix_rt::test]
async fn streams_tracking_data_alongside_replies(#[future] connected: Connected) {
    let Connected {
        mut socket,
        tracker,
        ..
    } = connected.await;
    register(&mut socket, "alice", true).await;
    register(&mut socket, "bob", false).await;
    let started = request(
        &mut socket,
        json!({"RequestType": "START_SESSION", "SessionRequest": {"UserName": "alice"}}),
    )
    .await;
    assert_eq!(started, json!({"ResponseType": "SESSION_STARTED", "SessionId": 1}));

    send(&mut socket, tracking_request("START_TRACKING", "alice", "bob")).await;
    send(
        &mut socket,
        json!({
            "RequestType": "REPORT_LOCATION",
            "LocationRequest": {
                "TrackeeName": "alice",
                "Longitude": -122.4,
                "Latitude": 37.7,
                "Timestamp": 1000
            }
        }),
    )
    .await;

    let mut frames = vec![next_json(&mut socket).await, next_json(&mut socket).await];
    frames.sort_by_key(|frame| frame["ResponseType"].as_str().map(str::to_owned));
    assert_eq!(frames[0], json!({"ResponseType": "LOCATION_ACCEPTED"}));
    assert_eq!(
        frames[1],
        json!({
            "ResponseType": "TRACKING_DATA",
            "TrackeeName": "alice",
            "TrackingData": {"Id": 1, "Longitude": -122.4, "Latitude": 37.7, "Timestamp": 1000}
        })
    );

    let stopped = request(&mut socket, tracking_request("STOP_TRACKING", "alice", "bob")).await;
    assert_eq!(
        stopped,
        json!({"ResponseType": "TRACKING_STOPPED", "TrackeeName": "alice", "UserName": "bob"})
    );
    wait_until_released(&tracker).await;

    let data = request(
        &mut socket,
        json!({"RequestType": "GET_SESSION_DATA", "SessionDataRequest": {"Id": 1}}),
    )
    .await;
    assert_eq!(data["ResponseType"], "SESSION_DATA");
    assert_eq!(
        data["Data"],
        json!([{"Id": 1, "Longitude": -122.4, "Latitude": 37.7, "Timestamp": 1000}])
    );

    let ids = request(
        &mut socket,
        json!({"RequestType": "GET_SESSION_IDS", "SessionIdsRequest": {"UserName": "alice"}}),
    )
    .await;
    assert_eq!(ids["ResponseType"], "SESSION_IDS");
    let entries = ids["Ids"].as_array().expect("session entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["Id"], 1);
    assert!(entries[0]["Timestamp"].as_i64().expect("start timestamp") > 0);
}

#[rstest]
#[actix_rt::test]
async fn reports_failures_with_request_names(#[future] connected: Connected) {
    let Connected { mut socket, .. } = connected.await;
    register(&mut socket, "alice", false).await;
    register(&mut socket, "bob", false).await;

    let reply = request(&mut socket, tracking_request("START_TRACKING", "alice", "bob")).await;
    assert_eq!(reply["ResponseType"], "ERROR");
    assert_eq!(reply["Code"], "not_trackable");
    assert_eq!(reply["TrackeeName"], "alice");
    assert_eq!(reply["UserName"], "bob");

    let reply = request(
        &mut socket,
        json!({"RequestType": "STOP_SESSION", "SessionRequest": {"UserName": "ghost"}}),
    )
    .await;
    assert_eq!(reply["Code"], "unknown_user");
    assert_eq!(reply["UserName"], "ghost");
    assert!(reply.get("TrackeeName").is_none());
}

#[rstest]
#[actix_rt::test]
async fn closing_the_socket_cancels_live_tracking(#[future] connected: Connected) {
    let Connected {
        mut socket,
        tracker,
        ..
    } = connected.await;
    register(&mut socket, "alice", true).await;
    register(&mut socket, "bob", false).await;
    send(&mut socket, tracking_request("START_TRACKING", "alice", "bob")).await;

    time::timeout(WAIT, async {
        while tracker.registry().is_empty() {
            time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("tracking registered");

    socket
        .send(awc::ws::Message::Close(None))
        .await
        .expect("send close");
    wait_until_released(&tracker).await;
}

#[rstest]
#[actix_rt::test]
async fn closes_on_malformed_json(#[future] connected: Connected) {
    let Connected { mut socket, .. } = connected.await;
    socket
        .send(awc::ws::Message::Text("not-json".into()))
        .await
        .expect("send text");

    let frame = socket.next().await.expect("response frame").expect("frame");
    match frame {
        Frame::Close(reason) => {
            assert_eq!(reason.expect("reason").code, CloseCode::Policy);
        }
        other => panic!("expected close frame, got {other:?}"),
    }
}

#[rstest]
#[actix_rt::test]
async fn closes_after_timeout_without_client_messages(#[future] connected: Connected) {
    let Connected { mut socket, .. } = connected.await;
    time::sleep(CLIENT_TIMEOUT + HEARTBEAT_INTERVAL * 3).await;

    let observed_close = time::timeout(Duration::from_secs(2), async {
        let mut observed = None;
        while let Some(frame) = socket.next().await {
            let frame = frame.expect("frame");
            match frame {
                Frame::Ping(_) | Frame::Pong(_) => continue,
                Frame::Close(reason) => {
                    observed = reason;
                    break;
                }
                other => panic!("unexpected frame before close: {other:?}"),
            }
        }
        observed
    })
    .await
    .expect("close frame missing within timeout")
    .expect("close frame missing after timeout");

    assert_eq!(observed_close.code, CloseCode::Normal);
    assert_eq!(observed_close.description.as_deref(), Some("heartbeat timeout"));
}
