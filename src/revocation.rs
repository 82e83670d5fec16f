//! Refresh-token revocation blacklist.
//!
//! Entries are keyed by a SHA-256 digest of the raw token; raw refresh
//! tokens never touch the store. The entry TTL equals the token's remaining
//! lifetime at revocation time, so an entry never outlives the token it
//! blocks and never expires before it.

use sha2::{Digest, Sha256};
use std::fmt::Write;
use std::sync::Arc;

use crate::kv::{Kv, KvError};

const BLACKLIST_PREFIX: &str = "blacklist";
const REVOKED_SENTINEL: &str = "1";

#[derive(Clone, Debug)]
pub struct RevocationStore {
    kv: Arc<Kv>,
}

impl RevocationStore {
    #[must_use]
    pub fn new(kv: Arc<Kv>) -> Self {
        Self { kv }
    }

    /// Record `raw_token` as revoked for `ttl_seconds`.
    ///
    /// A zero TTL is a no-op: the token has already expired on its own and
    /// there is nothing left to revoke.
    ///
    /// # Errors
    /// Propagates store failures loudly; silently failing to revoke would be
    /// a security regression, so callers surface this as a server error.
    pub async fn revoke(&self, raw_token: &str, ttl_seconds: u64) -> Result<(), KvError> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        self.kv
            .set_ex(&blacklist_key(raw_token), REVOKED_SENTINEL, ttl_seconds)
            .await
    }

    /// Whether `raw_token` has been revoked.
    ///
    /// # Errors
    /// Store failures propagate: an unverifiable revocation check is
    /// rejected upstream (fail-closed), never treated as "not revoked".
    pub async fn is_revoked(&self, raw_token: &str) -> Result<bool, KvError> {
        let value = self.kv.get(&blacklist_key(raw_token)).await?;
        Ok(value.is_some())
    }
}

fn blacklist_key(raw_token: &str) -> String {
    let digest = Sha256::digest(raw_token.as_bytes());
    let mut key = String::with_capacity(BLACKLIST_PREFIX.len() + 1 + 64);
    key.push_str(BLACKLIST_PREFIX);
    key.push(':');
    for byte in digest {
        let _ = write!(key, "{byte:02x}");
    }
    key
}
