//! Process settings loaded via OrthoConfig.
//!
//! Sources, lowest precedence first: defaults, configuration file,
//! `TRACKER_*` environment variables, command-line flags.

use std::time::Duration;

use location_tracker::outbound::store::RedisPoolConfig;
use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_HOST: &str = "0.0.0.0";
const DEFAULT_RPC_PORT: u16 = 8082;
const DEFAULT_WS_PORT: u16 = 8081;
const DEFAULT_POOL_MAX_SIZE: u32 = 16;
const DEFAULT_POOL_MIN_IDLE: u32 = 3;
const DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64 = 240;
const DEFAULT_POOL_CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Listener and store settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TRACKER")]
pub struct ServerSettings {
    /// Redis URL; the in-process store is used when absent.
    pub redis_url: Option<String>,
    /// Interface both listeners bind to.
    pub bind_host: Option<String>,
    /// Port of the HTTP + NDJSON listener.
    pub rpc_port: Option<u16>,
    /// Port of the WebSocket listener.
    pub ws_port: Option<u16>,
    pub pool_max_size: Option<u32>,
    /// Idle connections kept open; zero disables the floor.
    pub pool_min_idle: Option<u32>,
    pub pool_idle_timeout_secs: Option<u64>,
    pub pool_connection_timeout_secs: Option<u64>,
}

impl ServerSettings {
    pub fn bind_host(&self) -> &str {
        self.bind_host.as_deref().unwrap_or(DEFAULT_BIND_HOST)
    }

    pub fn rpc_bind(&self) -> (&str, u16) {
        (self.bind_host(), self.rpc_port.unwrap_or(DEFAULT_RPC_PORT))
    }

    pub fn ws_bind(&self) -> (&str, u16) {
        (self.bind_host(), self.ws_port.unwrap_or(DEFAULT_WS_PORT))
    }

    /// Pool configuration, or `None` when no Redis URL is configured.
    pub fn redis_pool(&self) -> Option<RedisPoolConfig> {
        let url = self.redis_url.as_deref()?;
        let min_idle = self.pool_min_idle.unwrap_or(DEFAULT_POOL_MIN_IDLE);
        Some(
            RedisPoolConfig::new(url)
                .with_max_size(self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE))
                .with_min_idle((min_idle > 0).then_some(min_idle))
                .with_idle_timeout(Duration::from_secs(
                    self.pool_idle_timeout_secs
                        .unwrap_or(DEFAULT_POOL_IDLE_TIMEOUT_SECS),
                ))
                .with_connection_timeout(Duration::from_secs(
                    self.pool_connection_timeout_secs
                        .unwrap_or(DEFAULT_POOL_CONNECTION_TIMEOUT_SECS),
                )),
        )
    }
}
