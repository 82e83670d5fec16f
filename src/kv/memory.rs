//! In-memory backend used by tests and local development.
//!
//! Expiry is checked lazily on access against a virtual clock that tests can
//! advance, so window-expiry behavior is deterministic without sleeping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    expires_at: Instant,
}

struct Inner {
    entries: HashMap<String, Entry>,
    clock_offset: Duration,
}

#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                clock_offset: Duration::ZERO,
            })),
        }
    }

    /// Advance the virtual clock used for expiry checks.
    pub fn advance(&self, duration: Duration) {
        let mut inner = self.lock();
        inner.clock_offset += duration;
    }

    pub(super) fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.lock();
        let now = Instant::now() + inner.clock_offset;
        match inner.entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                inner.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub(super) fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) {
        let mut inner = self.lock();
        let expires_at = Instant::now() + inner.clock_offset + Duration::from_secs(ttl_seconds);
        inner.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
    }

    pub(super) fn incr_ex(&self, key: &str, ttl_seconds: u64) -> i64 {
        let mut inner = self.lock();
        let now = Instant::now() + inner.clock_offset;

        if let Some(entry) = inner
            .entries
            .get_mut(key)
            .filter(|entry| entry.expires_at > now)
        {
            let count = entry.value.parse::<i64>().unwrap_or(0) + 1;
            // TTL unchanged: the window is fixed from first hit.
            entry.value = count.to_string();
            return count;
        }

        inner.entries.insert(
            key.to_string(),
            Entry {
                value: "1".to_string(),
                expires_at: now + Duration::from_secs(ttl_seconds),
            },
        );
        1
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use std::time::Duration;

    #[test]
    fn set_ex_and_get_round_trip() {
        let store = MemoryStore::new();
        store.set_ex("key", "value", 60);
        assert_eq!(store.get("key"), Some("value".to_string()));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let store = MemoryStore::new();
        store.set_ex("key", "value", 60);
        store.advance(Duration::from_secs(61));
        assert_eq!(store.get("key"), None);
    }

    #[test]
    fn incr_ex_counts_up_within_window() {
        let store = MemoryStore::new();
        assert_eq!(store.incr_ex("counter", 60), 1);
        assert_eq!(store.incr_ex("counter", 60), 2);
        assert_eq!(store.incr_ex("counter", 60), 3);
    }

    #[test]
    fn incr_ex_ttl_fixed_from_first_hit() {
        let store = MemoryStore::new();
        store.incr_ex("counter", 60);
        store.advance(Duration::from_secs(59));
        // A hit just before expiry must not extend the window.
        assert_eq!(store.incr_ex("counter", 60), 2);
        store.advance(Duration::from_secs(2));
        assert_eq!(store.incr_ex("counter", 60), 1);
    }
}
