//! Redis-backed cache.
//!
//! The connection is opened on first use and then reused through a
//! `ConnectionManager`, which reconnects on its own. An unreachable server at
//! startup therefore does not stop the service; each delivery fails with
//! `CacheError::Unavailable` until the server comes back.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

use super::cache::{CacheError, KvCache};

/// Writes ARGV[1] unless KEYS[1] already holds it. ARGV[2] is a TTL in
/// seconds, 0 for none. Returns 1 when written.
const SET_IF_DIFFERENT_LUA: &str = r#"
local current = redis.call('GET', KEYS[1])
if current == ARGV[1] then
    return 0
end
local ttl = tonumber(ARGV[2])
if ttl > 0 then
    redis.call('SET', KEYS[1], ARGV[1], 'EX', ttl)
else
    redis.call('SET', KEYS[1], ARGV[1])
end
return 1
"#;

const CONNECT_RETRIES: usize = 1;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

pub struct RedisCache {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
    script: redis::Script,
}

impl RedisCache {
    /// Validates the URL only; no connection is made yet.
    pub fn new(url: &str) -> Result<Self, CacheError> {
        let client =
            redis::Client::open(url).map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
            script: redis::Script::new(SET_IF_DIFFERENT_LUA),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                debug!("[cache] Connecting to redis");
                let config = ConnectionManagerConfig::new()
                    .set_number_of_retries(CONNECT_RETRIES)
                    .set_connection_timeout(CONNECT_TIMEOUT);
                ConnectionManager::new_with_config(self.client.clone(), config).await
            })
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl KvCache for RedisCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        match ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn set_if_different(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError> {
        let mut conn = self.connection().await?;
        let ttl_secs = ttl.map(|t| t.as_secs().max(1)).unwrap_or(0);
        let written: i64 = self
            .script
            .key(key)
            .arg(value)
            .arg(ttl_secs)
            .invoke_async(&mut conn)
            .await?;
        Ok(written == 1)
    }
}
