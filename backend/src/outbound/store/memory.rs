//! Process-local store gateway.
//!
//! Mirrors the Redis data types the domain relies on. Pub/sub uses one
//! Tokio broadcast channel per channel name; a subscriber that falls more
//! than [`CHANNEL_CAPACITY`] messages behind receives an `Unavailable` error.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures_util::stream;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::domain::ports::{NotificationStream, StoreError, StoreGateway};

/// Per-channel buffer for subscribers that have not yet consumed a message.
pub const CHANNEL_CAPACITY: usize = 1024;

#[derive(Default)]
struct State {
    scalars: HashMap<String, String>,
    hashes: HashMap<String, HashMap<String, String>>,
    sorted: HashMap<String, HashMap<String, i64>>,
    lists: HashMap<String, Vec<String>>,
    channels: HashMap<String, broadcast::Sender<String>>,
}

/// In-memory [`StoreGateway`].
#[derive(Default)]
pub struct InMemoryStoreGateway {
    state: Mutex<State>,
}

impl InMemoryStoreGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StoreGateway for InMemoryStoreGateway {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.state().scalars.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.state()
            .scalars
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut state = self.state();
        let current = match state.scalars.get(key) {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                StoreError::command(format!("value at {key} is not an integer"))
            })?,
            None => 0,
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::command(format!("increment of {key} overflows")))?;
        state.scalars.insert(key.to_owned(), next.to_string());
        Ok(next)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .state()
            .hashes
            .get(key)
            .and_then(|hash| hash.get(field))
            .cloned())
    }

    async fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        let state = self.state();
        let hash = state.hashes.get(key);
        Ok(fields
            .iter()
            .map(|field| hash.and_then(|hash| hash.get(field)).cloned())
            .collect())
    }

    async fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        let mut state = self.state();
        let hash = state.hashes.entry(key.to_owned()).or_default();
        hash.extend(fields.iter().cloned());
        Ok(())
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<(), StoreError> {
        if let Some(hash) = self.state().hashes.get_mut(key) {
            hash.remove(field);
        }
        Ok(())
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        Ok(self
            .state()
            .hashes
            .get(key)
            .is_some_and(|hash| hash.contains_key(field)))
    }

    async fn zadd(&self, key: &str, member: &str, score: i64) -> Result<(), StoreError> {
        self.state()
            .sorted
            .entry(key.to_owned())
            .or_default()
            .insert(member.to_owned(), score);
        Ok(())
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<(), StoreError> {
        if let Some(set) = self.state().sorted.get_mut(key) {
            set.remove(member);
        }
        Ok(())
    }

    async fn zrange_with_scores(&self, key: &str) -> Result<Vec<(String, i64)>, StoreError> {
        let state = self.state();
        let mut members: Vec<(String, i64)> = state
            .sorted
            .get(key)
            .map(|set| set.iter().map(|(m, s)| (m.clone(), *s)).collect())
            .unwrap_or_default();
        members.sort_by(|(a_member, a_score), (b_member, b_score)| {
            a_score.cmp(b_score).then_with(|| a_member.cmp(b_member))
        });
        Ok(members)
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>, StoreError> {
        Ok(self
            .state()
            .sorted
            .get(key)
            .and_then(|set| set.get(member))
            .copied())
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.state()
            .lists
            .entry(key.to_owned())
            .or_default()
            .push(value.to_owned());
        Ok(())
    }

    async fn lrange(&self, key: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.state().lists.get(key).cloned().unwrap_or_default())
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<usize, StoreError> {
        let state = self.state();
        let Some(sender) = state.channels.get(channel) else {
            return Ok(0);
        };
        Ok(sender.send(payload.to_owned()).unwrap_or(0))
    }

    async fn subscribe(&self, channel: &str) -> Result<NotificationStream, StoreError> {
        let receiver = self
            .state()
            .channels
            .entry(channel.to_owned())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();

        let notifications = stream::unfold(receiver, |mut receiver| async move {
            match receiver.recv().await {
                Ok(payload) => Some((Ok(payload), receiver)),
                Err(RecvError::Lagged(skipped)) => Some((
                    Err(StoreError::unavailable(format!(
                        "subscriber lagged behind by {skipped} notifications"
                    ))),
                    receiver,
                )),
                Err(RecvError::Closed) => None,
            }
        });
        Ok(Box::pin(notifications))
    }
}
