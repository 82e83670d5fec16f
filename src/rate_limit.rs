//! Fixed-window rate limiting backed by the shared key-value store.
//!
//! Counters are keyed `rate_limit:{scope}:{client}` and created with a TTL
//! equal to the window; the window never resets on subsequent hits. The
//! increment and the conditional expiry run as one atomic store operation,
//! so concurrent requests from the same client cannot both observe a count
//! below the limit and slip past it.

use std::sync::Arc;
use thiserror::Error;

use crate::kv::{Kv, KvError};

/// Named limiter scopes. Each scope has its own window; limits come from
/// configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateScope {
    /// Login attempts per client IP, 1-minute window.
    Login,
    /// General API calls per client IP, 5-minute window.
    Api,
}

impl RateScope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Api => "api",
        }
    }

    #[must_use]
    pub fn window_seconds(self) -> u64 {
        match self {
            Self::Login => 60,
            Self::Api => 300,
        }
    }
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limit exceeded, retry after {retry_after}s")]
    Limited { retry_after: u64 },
    #[error(transparent)]
    Store(#[from] KvError),
}

#[derive(Clone, Debug)]
pub struct RateLimiter {
    kv: Arc<Kv>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(kv: Arc<Kv>) -> Self {
        Self { kv }
    }

    /// Count this request against `(scope, client_id)` and reject once the
    /// window's limit is exhausted.
    ///
    /// # Errors
    /// Returns `Limited` when the counter exceeds `limit` within the window,
    /// or `Store` when the backing store is unreachable (the caller must not
    /// treat that as "not limited").
    pub async fn check_and_increment(
        &self,
        scope: RateScope,
        client_id: &str,
        limit: i64,
    ) -> Result<(), RateLimitError> {
        let key = format!("rate_limit:{}:{client_id}", scope.as_str());
        let window = scope.window_seconds();
        let count = self.kv.incr_ex(&key, window).await?;
        if count > limit {
            return Err(RateLimitError::Limited {
                retry_after: window,
            });
        }
        Ok(())
    }
}
