//! Store gateway adapters.
//!
//! - [`RedisStoreGateway`]: production adapter over a `bb8` Redis pool plus a
//!   dedicated pub/sub connection per subscription.
//! - [`InMemoryStoreGateway`]: process-local adapter used when no Redis URL is
//!   configured and by the test suites.

mod memory;
mod redis;

pub use memory::InMemoryStoreGateway;
pub use redis::{RedisPoolConfig, RedisStoreGateway};
