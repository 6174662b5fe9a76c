//! In-process cache backed by a `DashMap`.
//!
//! Only suitable for a single instance (local runs, tests): state is lost on
//! restart and not shared between replicas.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::{Duration, Instant};

use super::cache::{CacheError, KvCache};

struct Slot {
    value: String,
    expires_at: Option<Instant>,
}

impl Slot {
    fn new(value: &str, ttl: Option<Duration>) -> Self {
        Self {
            value: value.to_string(),
            expires_at: ttl.map(|t| Instant::now() + t),
        }
    }

    fn is_live(&self) -> bool {
        self.expires_at.is_none_or(|at| Instant::now() < at)
    }
}

#[derive(Default)]
pub struct MemoryCache {
    store: DashMap<String, Slot>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.store.iter().filter(|e| e.value().is_live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvCache for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self
            .store
            .get(key)
            .filter(|slot| slot.is_live())
            .map(|slot| slot.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.store.insert(key.to_string(), Slot::new(value, ttl));
        Ok(())
    }

    async fn set_if_different(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError> {
        // Entry holds the shard lock, so check and write are one step.
        match self.store.entry(key.to_string()) {
            Entry::Occupied(mut e) => {
                if e.get().is_live() && e.get().value == value {
                    return Ok(false);
                }
                e.insert(Slot::new(value, ttl));
                Ok(true)
            }
            Entry::Vacant(e) => {
                e.insert(Slot::new(value, ttl));
                Ok(true)
            }
        }
    }
}
