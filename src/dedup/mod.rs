//! Duplicate delivery detection
//!
//! The platform delivers at least once and may redeliver the same event. A
//! single cache key holds the uid of the last event seen; a delivery carrying
//! that same uid is dropped.
//!
//! # Concurrency
//!
//! In `ReadThenWrite` mode the check is a plain get followed by a set. Two
//! concurrent deliveries of the same event can both read "not seen" and both
//! go on to transfer. `Atomic` mode closes that gap with a single
//! set-if-different operation on the cache.

pub mod cache;
pub mod memory;
pub mod redis_cache;

pub use cache::{CacheError, KvCache};
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::config::{CacheBackend, CacheConfig, DedupMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// First time this uid is seen; it is now the last-seen uid
    Fresh,
    Duplicate,
}

pub struct IdempotencyGuard {
    cache: Arc<dyn KvCache>,
    key: String,
    ttl: Option<Duration>,
    mode: DedupMode,
}

impl IdempotencyGuard {
    pub fn new(cache: Arc<dyn KvCache>, key: impl Into<String>) -> Self {
        Self {
            cache,
            key: key.into(),
            ttl: None,
            mode: DedupMode::ReadThenWrite,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        let cache: Arc<dyn KvCache> = match config.backend {
            CacheBackend::Redis => Arc::new(RedisCache::new(&config.url)?),
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
        };
        Ok(Self::new(cache, config.key.clone())
            .with_ttl(config.ttl_secs.map(Duration::from_secs))
            .with_mode(config.mode))
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_mode(mut self, mode: DedupMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn backend(&self) -> &'static str {
        self.cache.name()
    }

    /// Report whether `event_uid` was the last one processed, recording it if not.
    ///
    /// A duplicate performs no write. An empty uid cannot be tracked and is
    /// always `Fresh`.
    pub async fn check_and_record(&self, event_uid: &str) -> Result<Delivery, CacheError> {
        if event_uid.is_empty() {
            warn!("[dedup] Delivery has no event uid, duplicate check skipped");
            return Ok(Delivery::Fresh);
        }

        match self.mode {
            DedupMode::ReadThenWrite => {
                let last = self.cache.get(&self.key).await?;
                if last.as_deref() == Some(event_uid) {
                    return Ok(Delivery::Duplicate);
                }
                self.cache.set(&self.key, event_uid, self.ttl).await?;
                Ok(Delivery::Fresh)
            }
            DedupMode::Atomic => {
                let written = self
                    .cache
                    .set_if_different(&self.key, event_uid, self.ttl)
                    .await?;
                Ok(if written {
                    Delivery::Fresh
                } else {
                    Delivery::Duplicate
                })
            }
        }
    }
}
