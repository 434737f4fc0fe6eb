//! End-to-end behaviour of the tracker service over the in-memory store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use rstest::{fixture, rstest};
use tokio::time::timeout;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{NotificationStream, StoreError};
use crate::domain::test_support::{FixedClock, name};
use crate::outbound::store::InMemoryStoreGateway;

const WAIT: Duration = Duration::from_secs(2);

#[fixture]
fn service() -> LocationTrackerService {
    LocationTrackerService::new(
        Arc::new(InMemoryStoreGateway::new()),
        Arc::new(FixedClock::at(1_700_000_000)),
    )
}

/// In-memory store whose `subscribe` can be switched to fail.
#[derive(Default)]
struct FlakySubscriptions {
    inner: InMemoryStoreGateway,
    failing: AtomicBool,
}

#[async_trait]
impl StoreGateway for FlakySubscriptions {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set(key, value).await
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.inner.incr(key).await
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.inner.hget(key, field).await
    }

    async fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        self.inner.hmget(key, fields).await
    }

    async fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        self.inner.hset(key, fields).await
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<(), StoreError> {
        self.inner.hdel(key, field).await
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.inner.hexists(key, field).await
    }

    async fn zadd(&self, key: &str, member: &str, score: i64) -> Result<(), StoreError> {
        self.inner.zadd(key, member, score).await
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<(), StoreError> {
        self.inner.zrem(key, member).await
    }

    async fn zrange_with_scores(&self, key: &str) -> Result<Vec<(String, i64)>, StoreError> {
        self.inner.zrange_with_scores(key).await
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>, StoreError> {
        self.inner.zscore(key, member).await
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.rpush(key, value).await
    }

    async fn lrange(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.inner.lrange(key).await
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<usize, StoreError> {
        self.inner.publish(channel, payload).await
    }

    async fn subscribe(&self, channel: &str) -> Result<NotificationStream, StoreError> {
        if self.failing.load(Ordering::Acquire) {
            return Err(StoreError::unavailable("subscription refused"));
        }
        self.inner.subscribe(channel).await
    }
}

fn report(longitude: f64, latitude: f64, timestamp: i64) -> LocationReport {
    LocationReport {
        longitude,
        latitude,
        timestamp,
    }
}

async fn next_record(tracking: &mut LiveTracking) -> LocationRecord {
    timeout(WAIT, tracking.next())
        .await
        .expect("record arrives in time")
        .expect("stream still open")
        .expect("no failure")
}

#[rstest]
#[tokio::test]
async fn alice_and_bob_scenario(service: LocationTrackerService) {
    let alice = service.register_user(&name("alice"), true).await.expect("alice");
    let bob = service.register_user(&name("bob"), false).await.expect("bob");
    assert_eq!((alice, bob), (UserId::new(1), UserId::new(2)));

    let session = service.open_session(&name("alice")).await.expect("session");
    assert_eq!(session, SessionId::new(1));

    let mut tracking = service
        .begin_tracking(TrackingPair::new(name("alice"), name("bob")))
        .await
        .expect("bob tracks alice");
    service
        .submit_location(&name("alice"), report(-122.4, 37.7, 1_000))
        .await
        .expect("report");

    let received = next_record(&mut tracking).await;
    assert_eq!(received.report(), report(-122.4, 37.7, 1_000));

    let track = service.fetch_session_track(session).await.expect("track");
    let positions: Vec<LocationReport> = track.iter().map(LocationRecord::report).collect();
    assert_eq!(positions, vec![report(-122.4, 37.7, 1_000)]);
    assert_eq!(
        service.list_trackables().await.expect("trackables"),
        vec![name("alice")]
    );
}

#[rstest]
#[tokio::test]
async fn every_watcher_sees_every_report_in_order(service: LocationTrackerService) {
    service.register_user(&name("alice"), true).await.expect("alice");
    for watcher in ["bob", "carol"] {
        service.register_user(&name(watcher), false).await.expect("watcher");
    }
    service.open_session(&name("alice")).await.expect("session");

    let mut bob = service
        .begin_tracking(TrackingPair::new(name("alice"), name("bob")))
        .await
        .expect("bob");
    let mut carol = service
        .begin_tracking(TrackingPair::new(name("alice"), name("carol")))
        .await
        .expect("carol");

    for timestamp in 0..20 {
        service
            .submit_location(&name("alice"), report(0.5, 0.25, timestamp))
            .await
            .expect("report");
    }

    for tracking in [&mut bob, &mut carol] {
        let mut timestamps = Vec::new();
        for _ in 0..20 {
            timestamps.push(next_record(tracking).await.timestamp);
        }
        assert_eq!(timestamps, (0..20).collect::<Vec<_>>());
    }
}

#[rstest]
#[tokio::test]
async fn beginning_again_replaces_the_previous_stream(service: LocationTrackerService) {
    service.register_user(&name("alice"), true).await.expect("alice");
    service.register_user(&name("bob"), false).await.expect("bob");
    let pair = TrackingPair::new(name("alice"), name("bob"));

    let mut first = service.begin_tracking(pair.clone()).await.expect("first");
    let mut second = service.begin_tracking(pair.clone()).await.expect("second");

    assert!(first.handle().is_cancelled());
    assert!(timeout(WAIT, first.next()).await.expect("prompt").is_none());
    drop(first);
    assert!(service.registry().is_tracking(&pair));

    service.open_session(&name("alice")).await.expect("session");
    service
        .submit_location(&name("alice"), report(3.0, 4.0, 5))
        .await
        .expect("report");
    assert_eq!(next_record(&mut second).await.timestamp, 5);
}

#[rstest]
#[tokio::test]
async fn failed_restart_keeps_the_running_stream() {
    let store = Arc::new(FlakySubscriptions::default());
    let service =
        LocationTrackerService::new(store.clone(), Arc::new(FixedClock::at(1_700_000_000)));
    service.register_user(&name("alice"), true).await.expect("alice");
    service.register_user(&name("bob"), false).await.expect("bob");
    let pair = TrackingPair::new(name("alice"), name("bob"));
    let mut running = service.begin_tracking(pair.clone()).await.expect("first");

    store.failing.store(true, Ordering::Release);
    let error = service
        .begin_tracking(pair.clone())
        .await
        .err()
        .expect("restart fails");
    assert_eq!(error.code(), ErrorCode::SubscriptionFailure);

    assert!(!running.handle().is_cancelled());
    assert!(service.registry().is_tracking(&pair));
    service.open_session(&name("alice")).await.expect("session");
    service
        .submit_location(&name("alice"), report(1.0, 2.0, 7))
        .await
        .expect("report");
    assert_eq!(next_record(&mut running).await.timestamp, 7);
}

#[rstest]
#[tokio::test]
async fn end_tracking_cancels_and_removes_the_edge(service: LocationTrackerService) {
    service.register_user(&name("alice"), true).await.expect("alice");
    service.register_user(&name("bob"), false).await.expect("bob");
    let pair = TrackingPair::new(name("alice"), name("bob"));
    let tracking = service.begin_tracking(pair.clone()).await.expect("begin");

    let runner = tokio::spawn(tracking.run(|_| async { Ok(()) }));
    service.end_tracking(&pair).await.expect("end");

    timeout(WAIT, runner)
        .await
        .expect("run returns after cancel")
        .expect("joined")
        .expect("cancellation is not an error");
    assert!(service.registry().is_empty());
    assert!(
        service
            .tracking
            .watchers(&name("alice"))
            .await
            .expect("edges")
            .is_empty()
    );
}

#[rstest]
#[tokio::test]
async fn dropping_the_stream_frees_the_registry(service: LocationTrackerService) {
    service.register_user(&name("alice"), true).await.expect("alice");
    service.register_user(&name("bob"), false).await.expect("bob");
    let tracking = service
        .begin_tracking(TrackingPair::new(name("alice"), name("bob")))
        .await
        .expect("begin");
    let mut records = Box::pin(tracking.into_stream());
    assert_eq!(service.registry().len(), 1);

    service.open_session(&name("alice")).await.expect("session");
    service
        .submit_location(&name("alice"), report(1.0, 1.0, 1))
        .await
        .expect("report");
    let first = timeout(WAIT, records.next())
        .await
        .expect("prompt")
        .expect("item")
        .expect("record");
    assert_eq!(first.timestamp, 1);

    drop(records);
    assert!(service.registry().is_empty());
}

#[rstest]
#[tokio::test]
async fn tracking_a_non_trackable_user_registers_nothing(service: LocationTrackerService) {
    service.register_user(&name("alice"), false).await.expect("alice");
    service.register_user(&name("bob"), false).await.expect("bob");

    let error = service
        .begin_tracking(TrackingPair::new(name("alice"), name("bob")))
        .await
        .expect_err("not trackable");
    assert_eq!(error.code(), ErrorCode::NotTrackable);
    assert!(service.registry().is_empty());
}

#[rstest]
#[tokio::test]
async fn reporting_without_a_session_is_rejected(service: LocationTrackerService) {
    service.register_user(&name("alice"), true).await.expect("alice");
    let error = service
        .submit_location(&name("alice"), report(0.0, 0.0, 0))
        .await
        .expect_err("no session");
    assert_eq!(error.code(), ErrorCode::NoActiveSession);

    let error = service
        .submit_location(&name("ghost"), report(0.0, 0.0, 0))
        .await
        .expect_err("unknown");
    assert_eq!(error.code(), ErrorCode::UnknownUser);
}
