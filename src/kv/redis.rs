//! Redis backend.
//!
//! Key patterns:
//! - `blacklist:{sha256}` — revoked refresh tokens
//! - `rate_limit:{scope}:{client}` — fixed-window counters

use redis::{AsyncCommands, Script, aio::ConnectionManager};

use super::KvError;

/// Counter increment that sets the window TTL only on key creation.
/// Subsequent hits within the window never extend it.
const INCR_EX_SCRIPT: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
";

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis and return a store backed by a reconnecting
    /// connection manager.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the initial connection fails.
    pub async fn connect(url: &str) -> Result<Self, KvError> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self { connection })
    }

    pub(super) async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut connection = self.connection.clone();
        Ok(connection.get(key).await?)
    }

    pub(super) async fn set_ex(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), KvError> {
        let mut connection = self.connection.clone();
        connection.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        Ok(())
    }

    pub(super) async fn incr_ex(&self, key: &str, ttl_seconds: u64) -> Result<i64, KvError> {
        let mut connection = self.connection.clone();
        let count: i64 = Script::new(INCR_EX_SCRIPT)
            .key(key)
            .arg(ttl_seconds)
            .invoke_async(&mut connection)
            .await?;
        Ok(count)
    }
}
