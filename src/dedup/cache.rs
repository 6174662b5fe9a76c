//! Key-value cache seam used by the idempotency guard.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache command failed: {0}")]
    Command(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() {
            CacheError::Unavailable(e.to_string())
        } else {
            CacheError::Command(e.to_string())
        }
    }
}

/// Minimal string cache.
#[async_trait]
pub trait KvCache: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Atomically store `value` unless the key already holds exactly `value`.
    ///
    /// Returns `false` (and writes nothing) when the stored value was equal.
    async fn set_if_different(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError>;
}
