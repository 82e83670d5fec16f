//! Key-value store seam for revocation entries and rate counters.
//!
//! The store is the serialization point for every limit and revocation
//! decision, so the interface only exposes operations the backend can make
//! atomic. Backends are enum-dispatched: `Redis` in production, `Memory` for
//! tests and local development.

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("key-value store unavailable: {0}")]
    Unavailable(#[from] ::redis::RedisError),
}

/// Key-value backend. All operations take `&self`; backends handle their own
/// interior synchronization.
#[derive(Clone)]
pub enum Kv {
    Redis(RedisStore),
    Memory(MemoryStore),
}

impl Kv {
    /// Fetch the value stored at `key`, if present and unexpired.
    ///
    /// # Errors
    /// Returns `KvError::Unavailable` if the backing store cannot be reached.
    pub async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        match self {
            Self::Redis(store) => store.get(key).await,
            Self::Memory(store) => Ok(store.get(key)),
        }
    }

    /// Store `value` at `key` with a TTL in seconds, replacing any previous
    /// value and TTL.
    ///
    /// # Errors
    /// Returns `KvError::Unavailable` if the backing store cannot be reached.
    pub async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), KvError> {
        match self {
            Self::Redis(store) => store.set_ex(key, value, ttl_seconds).await,
            Self::Memory(store) => {
                store.set_ex(key, value, ttl_seconds);
                Ok(())
            }
        }
    }

    /// Atomically increment the counter at `key`, setting the TTL only when
    /// the key is created. Returns the counter value after the increment.
    ///
    /// The increment and the conditional expiry execute as one store-side
    /// operation; two concurrent callers always observe distinct counts.
    ///
    /// # Errors
    /// Returns `KvError::Unavailable` if the backing store cannot be reached.
    pub async fn incr_ex(&self, key: &str, ttl_seconds: u64) -> Result<i64, KvError> {
        match self {
            Self::Redis(store) => store.incr_ex(key, ttl_seconds).await,
            Self::Memory(store) => Ok(store.incr_ex(key, ttl_seconds)),
        }
    }
}

impl std::fmt::Debug for Kv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redis(_) => f.write_str("Kv::Redis"),
            Self::Memory(_) => f.write_str("Kv::Memory"),
        }
    }
}
