//! Live monitor: turns a trackee's notification channel into records.
//!
//! A [`LocationSubscription`] serves exactly one watcher. It yields records
//! in publish order until its [`MonitorHandle`] is cancelled or a terminal
//! failure is reported. Payloads that are not record keys, and keys whose
//! record has vanished, are logged and skipped.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::ports::{NotificationStream, StoreError, StoreGateway};
use crate::domain::{Error, ErrorCode, LocationKey, LocationLedger, LocationRecord, TrackingPair, keys};

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Cloneable cancel handle of one subscription.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    id: u64,
    cancel: Arc<watch::Sender<bool>>,
}

impl MonitorHandle {
    fn new() -> (Self, watch::Receiver<bool>) {
        let (sender, receiver) = watch::channel(false);
        let handle = Self {
            id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
            cancel: Arc::new(sender),
        };
        (handle, receiver)
    }

    /// A handle with no subscription behind it.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self::new().0
    }

    /// Process-unique identifier of the subscription behind this handle.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop the subscription; idempotent and effective immediately.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

/// Opens live subscriptions on trackee channels.
#[derive(Clone)]
pub struct LiveMonitor {
    store: Arc<dyn StoreGateway>,
    ledger: LocationLedger,
}

impl LiveMonitor {
    pub fn new(store: Arc<dyn StoreGateway>, ledger: LocationLedger) -> Self {
        Self { store, ledger }
    }

    /// Subscribe to the trackee's channel on behalf of the watcher.
    ///
    /// The subscription is active when this returns, so every later report
    /// by the trackee is delivered.
    pub async fn subscribe(&self, pair: TrackingPair) -> Result<LocationSubscription, Error> {
        let channel = keys::channel(&pair.trackee);
        let notifications = self.store.subscribe(&channel).await.map_err(|err| {
            warn!(channel = %channel, error = %err, "subscription failed");
            Error::subscription_failure(format!("cannot subscribe to {channel}: {err}"))
        })?;
        let (handle, cancelled) = MonitorHandle::new();
        debug!(pair = %pair, handle_id = handle.id(), "subscribed");
        Ok(LocationSubscription {
            pair,
            notifications,
            ledger: self.ledger.clone(),
            cancelled,
            handle,
            finished: false,
        })
    }
}

enum Wake {
    Cancelled,
    Notification(Option<Result<String, StoreError>>),
}

/// One watcher's live view of a trackee.
pub struct LocationSubscription {
    pair: TrackingPair,
    notifications: NotificationStream,
    ledger: LocationLedger,
    cancelled: watch::Receiver<bool>,
    handle: MonitorHandle,
    finished: bool,
}

impl fmt::Debug for LocationSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationSubscription")
            .field("pair", &self.pair)
            .field("handle_id", &self.handle.id)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl LocationSubscription {
    #[must_use]
    pub fn pair(&self) -> &TrackingPair {
        &self.pair
    }

    /// Cancel handle for this subscription.
    #[must_use]
    pub fn handle(&self) -> MonitorHandle {
        self.handle.clone()
    }

    /// Next record, an error once, or `None` after cancellation or failure.
    pub async fn next(&mut self) -> Option<Result<LocationRecord, Error>> {
        while !self.finished {
            let wake = tokio::select! {
                biased;
                _ = self.cancelled.wait_for(|cancelled| *cancelled) => Wake::Cancelled,
                item = self.notifications.next() => Wake::Notification(item),
            };

            let payload = match wake {
                Wake::Cancelled => {
                    debug!(pair = %self.pair, "subscription cancelled");
                    self.finished = true;
                    return None;
                }
                Wake::Notification(None) => {
                    return Some(Err(self.fail("notification stream closed".to_owned())));
                }
                Wake::Notification(Some(Err(err))) => {
                    return Some(Err(self.fail(err.to_string())));
                }
                Wake::Notification(Some(Ok(payload))) => payload,
            };

            let key = match payload.parse::<LocationKey>() {
                Ok(key) => key,
                Err(err) => {
                    warn!(pair = %self.pair, error = %err, "skipping notification");
                    continue;
                }
            };
            match self.ledger.get_location(key).await {
                Ok(record) => return Some(Ok(record)),
                Err(err) if err.code() == ErrorCode::NotFound => {
                    warn!(pair = %self.pair, key = %key, "skipping notification for missing record");
                }
                Err(err) => {
                    warn!(pair = %self.pair, error = %err, "record lookup failed");
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }

    /// Deliver records to `on_location` until cancelled (`Ok`) or a
    /// store, subscription or delivery failure (`Err`).
    pub async fn run<F, Fut>(mut self, mut on_location: F) -> Result<(), Error>
    where
        F: FnMut(LocationRecord) -> Fut,
        Fut: Future<Output = Result<(), Error>>,
    {
        while let Some(item) = self.next().await {
            on_location(item?).await?;
        }
        Ok(())
    }

    fn fail(&mut self, reason: String) -> Error {
        warn!(pair = %self.pair, reason = %reason, "subscription failed");
        self.finished = true;
        Error::subscription_failure(format!("live tracking of {} ended: {reason}", self.pair.trackee))
    }
}
