//! Redis-backed store gateway.
//!
//! Commands run on connections checked out from a `bb8` pool; the checkout
//! is released when the command completes, including on error. Each
//! subscription opens its own pub/sub connection from the client, since a
//! subscribed connection cannot serve other commands.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, RunError};
use bb8_redis::redis::{self, Cmd, FromRedisValue, RedisError};
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::domain::ports::{NotificationStream, StoreError, StoreGateway};

/// Configuration for the Redis connection pool.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use location_tracker::outbound::store::RedisPoolConfig;
///
/// let config = RedisPoolConfig::new("redis://127.0.0.1:6379")
///     .with_max_size(8)
///     .with_idle_timeout(Duration::from_secs(60));
/// assert_eq!(config.redis_url(), "redis://127.0.0.1:6379");
/// ```
#[derive(Debug, Clone)]
pub struct RedisPoolConfig {
    redis_url: String,
    max_size: u32,
    min_idle: Option<u32>,
    idle_timeout: Duration,
    connection_timeout: Duration,
}

impl RedisPoolConfig {
    /// Create a configuration for the given URL.
    ///
    /// Defaults:
    /// - `max_size`: 16 connections
    /// - `min_idle`: 3 connections
    /// - `idle_timeout`: 240 seconds
    /// - `connection_timeout`: 5 seconds
    pub fn new(redis_url: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            max_size: 16,
            min_idle: Some(3),
            idle_timeout: Duration::from_secs(240),
            connection_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_min_idle(mut self, min_idle: Option<u32>) -> Self {
        self.min_idle = min_idle;
        self
    }

    /// Idle connections older than this are closed.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Upper bound on waiting for a pooled connection.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn redis_url(&self) -> &str {
        &self.redis_url
    }
}

/// [`StoreGateway`] over Redis.
#[derive(Clone)]
pub struct RedisStoreGateway {
    pool: Pool<RedisConnectionManager>,
    client: redis::Client,
}

impl RedisStoreGateway {
    /// Build the pool and verify the URL.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` when the URL is invalid or the
    /// initial connections cannot be established.
    pub async fn connect(config: RedisPoolConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.redis_url.as_str()).map_err(map_redis_error)?;
        let manager =
            RedisConnectionManager::new(config.redis_url.as_str()).map_err(map_redis_error)?;
        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(config.min_idle)
            .idle_timeout(Some(config.idle_timeout))
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| StoreError::unavailable(format!("failed to build redis pool: {err}")))?;
        debug!(max_size = config.max_size, "redis pool ready");
        Ok(Self { pool, client })
    }

    async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> Result<T, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_run_error)?;
        let value: T = cmd.query_async(&mut *conn).await.map_err(map_redis_error)?;
        Ok(value)
    }
}

fn map_redis_error(err: RedisError) -> StoreError {
    if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
        StoreError::unavailable(err.to_string())
    } else {
        StoreError::command(err.to_string())
    }
}

fn map_run_error(err: RunError<RedisError>) -> StoreError {
    match err {
        RunError::User(err) => map_redis_error(err),
        RunError::TimedOut => StoreError::unavailable("timed out waiting for a redis connection"),
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "scores are written from i64 seconds and read back as whole floats"
)]
fn score_to_i64(score: f64) -> i64 {
    score.round() as i64
}

#[async_trait]
impl StoreGateway for RedisStoreGateway {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.query(redis::cmd("GET").arg(key)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.query(redis::cmd("SET").arg(key).arg(value)).await
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.query(redis::cmd("INCR").arg(key)).await
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.query(redis::cmd("HGET").arg(key).arg(field)).await
    }

    async fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let mut cmd = redis::cmd("HMGET");
        cmd.arg(key);
        for field in fields {
            cmd.arg(field);
        }
        self.query(&cmd).await
    }

    async fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in fields {
            cmd.arg(field).arg(value);
        }
        let _written: i64 = self.query(&cmd).await?;
        Ok(())
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<(), StoreError> {
        let _removed: i64 = self.query(redis::cmd("HDEL").arg(key).arg(field)).await?;
        Ok(())
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.query(redis::cmd("HEXISTS").arg(key).arg(field)).await
    }

    async fn zadd(&self, key: &str, member: &str, score: i64) -> Result<(), StoreError> {
        let _added: i64 = self
            .query(redis::cmd("ZADD").arg(key).arg(score).arg(member))
            .await?;
        Ok(())
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let _removed: i64 = self.query(redis::cmd("ZREM").arg(key).arg(member)).await?;
        Ok(())
    }

    async fn zrange_with_scores(&self, key: &str) -> Result<Vec<(String, i64)>, StoreError> {
        let members: Vec<(String, f64)> = self
            .query(redis::cmd("ZRANGE").arg(key).arg(0).arg(-1).arg("WITHSCORES"))
            .await?;
        Ok(members
            .into_iter()
            .map(|(member, score)| (member, score_to_i64(score)))
            .collect())
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>, StoreError> {
        let score: Option<f64> = self.query(redis::cmd("ZSCORE").arg(key).arg(member)).await?;
        Ok(score.map(score_to_i64))
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _length: i64 = self.query(redis::cmd("RPUSH").arg(key).arg(value)).await?;
        Ok(())
    }

    async fn lrange(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.query(redis::cmd("LRANGE").arg(key).arg(0).arg(-1)).await
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<usize, StoreError> {
        self.query(redis::cmd("PUBLISH").arg(channel).arg(payload)).await
    }

    async fn subscribe(&self, channel: &str) -> Result<NotificationStream, StoreError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(map_redis_error)?;
        pubsub.subscribe(channel).await.map_err(map_redis_error)?;
        debug!(channel, "redis subscription open");

        let channel = channel.to_owned();
        let notifications = pubsub.into_on_message().map(move |msg| {
            msg.get_payload::<String>().map_err(|err| {
                warn!(channel = %channel, error = %err, "undecodable notification");
                StoreError::command(err.to_string())
            })
        });
        Ok(Box::pin(notifications))
    }
}
