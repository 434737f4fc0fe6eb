//! Port over the key-value, sorted-set, list and pub/sub store.
//!
//! Adapters acquire a pooled connection per call and release it when the call
//! completes, including on error. Calls are never retried here; callers see
//! the first failure.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

/// Errors raised by store gateway adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A connection could not be obtained or was lost mid-call.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
    /// The store rejected a command or returned an undecodable reply.
    #[error("store command failed: {message}")]
    Command { message: String },
}

impl StoreError {
    /// Create an unavailable error with the given message.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a command error with the given message.
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command {
            message: message.into(),
        }
    }
}

impl From<StoreError> for crate::domain::Error {
    fn from(value: StoreError) -> Self {
        Self::store_unavailable(value.to_string())
    }
}

/// Payloads published on a channel, in publish order.
///
/// The stream ends when the underlying subscription connection closes.
pub type NotificationStream = Pin<Box<dyn Stream<Item = Result<String, StoreError>> + Send>>;

/// Primitive store operations used by the domain managers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Read a scalar value.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite a scalar value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Increment a counter and return the new value; missing counters start at zero.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Read a single hash field.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    /// Read several hash fields, preserving the requested order.
    async fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>, StoreError>;

    /// Write one or more hash fields.
    async fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError>;

    /// Remove a hash field; absent fields are ignored.
    async fn hdel(&self, key: &str, field: &str) -> Result<(), StoreError>;

    /// Whether a hash field exists.
    async fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError>;

    /// Add or re-score a sorted-set member.
    async fn zadd(&self, key: &str, member: &str, score: i64) -> Result<(), StoreError>;

    /// Remove a sorted-set member; absent members are ignored.
    async fn zrem(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// All members with their scores, ascending by score.
    async fn zrange_with_scores(&self, key: &str) -> Result<Vec<(String, i64)>, StoreError>;

    /// Score of a single member.
    async fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>, StoreError>;

    /// Append to the tail of a list.
    async fn rpush(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// The whole list, head first.
    async fn lrange(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Publish a payload and return the number of subscribers that received it.
    async fn publish(&self, channel: &str, payload: &str) -> Result<usize, StoreError>;

    /// Subscribe to a channel on a dedicated connection.
    async fn subscribe(&self, channel: &str) -> Result<NotificationStream, StoreError>;
}
