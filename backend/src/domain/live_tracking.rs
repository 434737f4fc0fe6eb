//! A registered live-tracking stream handed to transports.

use std::future::Future;

use futures_util::Stream;
use futures_util::stream;

use crate::domain::{
    Error, LocationRecord, LocationSubscription, MonitorHandle, TrackingLease, TrackingPair,
};

/// Subscription plus the registry lease that keeps it addressable by
/// `end_tracking`. Dropping it ends the stream and frees the registry entry.
#[derive(Debug)]
pub struct LiveTracking {
    subscription: LocationSubscription,
    _lease: TrackingLease,
}

impl LiveTracking {
    pub(crate) fn new(subscription: LocationSubscription, lease: TrackingLease) -> Self {
        Self {
            subscription,
            _lease: lease,
        }
    }

    #[must_use]
    pub fn pair(&self) -> &TrackingPair {
        self.subscription.pair()
    }

    #[must_use]
    pub fn handle(&self) -> MonitorHandle {
        self.subscription.handle()
    }

    /// See [`LocationSubscription::next`].
    pub async fn next(&mut self) -> Option<Result<LocationRecord, Error>> {
        self.subscription.next().await
    }

    /// See [`LocationSubscription::run`]. The registry entry is freed when
    /// this returns.
    pub async fn run<F, Fut>(self, on_location: F) -> Result<(), Error>
    where
        F: FnMut(LocationRecord) -> Fut,
        Fut: Future<Output = Result<(), Error>>,
    {
        let Self {
            subscription,
            _lease,
        } = self;
        subscription.run(on_location).await
    }

    /// Adapt into a stream that ends after cancellation or the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<LocationRecord, Error>> + Send {
        stream::unfold(self, |mut tracking| async move {
            tracking.next().await.map(|item| (item, tracking))
        })
    }
}
