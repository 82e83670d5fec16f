//! Auth configuration and shared state.
//!
//! Everything the auth flows share — signing secret, TTLs, limiter, and the
//! revocation blacklist — is constructed once at startup and injected as
//! `Extension<Arc<AuthState>>`. No ambient globals: tests build their own
//! state with a memory-backed store.

use secrecy::SecretString;
use std::sync::Arc;

use super::storage::UserStore;
use crate::audit::AuditRecorder;
use crate::kv::Kv;
use crate::rate_limit::RateLimiter;
use crate::revocation::RevocationStore;
use crate::token::TokenService;

const DEFAULT_ACCESS_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_LEEWAY_SECONDS: u64 = 0;
const DEFAULT_LOGIN_LIMIT: i64 = 5;
const DEFAULT_API_LIMIT: i64 = 100;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    leeway_seconds: u64,
    login_limit: i64,
    api_limit: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            leeway_seconds: DEFAULT_LEEWAY_SECONDS,
            login_limit: DEFAULT_LOGIN_LIMIT,
            api_limit: DEFAULT_API_LIMIT,
        }
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_leeway_seconds(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_login_limit(mut self, limit: i64) -> Self {
        self.login_limit = limit;
        self
    }

    #[must_use]
    pub fn with_api_limit(mut self, limit: i64) -> Self {
        self.api_limit = limit;
        self
    }

    #[must_use]
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    #[must_use]
    pub fn leeway_seconds(&self) -> u64 {
        self.leeway_seconds
    }

    #[must_use]
    pub fn login_limit(&self) -> i64 {
        self.login_limit
    }

    #[must_use]
    pub fn api_limit(&self) -> i64 {
        self.api_limit
    }
}

pub struct AuthState {
    config: AuthConfig,
    tokens: TokenService,
    limiter: RateLimiter,
    revocations: RevocationStore,
    users: UserStore,
    audit: AuditRecorder,
}

impl AuthState {
    #[must_use]
    pub(crate) fn new(
        config: AuthConfig,
        jwt_secret: &SecretString,
        kv: Arc<Kv>,
        users: UserStore,
        audit: AuditRecorder,
    ) -> Self {
        let tokens = TokenService::new(
            jwt_secret,
            config.access_ttl_seconds(),
            config.refresh_ttl_seconds(),
            config.leeway_seconds(),
        );
        Self {
            config,
            tokens,
            limiter: RateLimiter::new(kv.clone()),
            revocations: RevocationStore::new(kv),
            users,
            audit,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    #[must_use]
    pub fn revocations(&self) -> &RevocationStore {
        &self.revocations
    }

    #[must_use]
    pub(crate) fn users(&self) -> &UserStore {
        &self.users
    }

    #[must_use]
    pub fn audit(&self) -> &AuditRecorder {
        &self.audit
    }
}

#[cfg(test)]
mod tests {
    use super::AuthConfig;

    #[test]
    fn defaults_match_deployment_baseline() {
        let config = AuthConfig::new();
        assert_eq!(config.access_ttl_seconds(), 900);
        assert_eq!(config.refresh_ttl_seconds(), 86_400);
        assert_eq!(config.leeway_seconds(), 0);
        assert_eq!(config.login_limit(), 5);
        assert_eq!(config.api_limit(), 100);
    }

    #[test]
    fn builders_override_defaults() {
        let config = AuthConfig::new()
            .with_access_ttl_seconds(60)
            .with_refresh_ttl_seconds(120)
            .with_leeway_seconds(5)
            .with_login_limit(2)
            .with_api_limit(10);
        assert_eq!(config.access_ttl_seconds(), 60);
        assert_eq!(config.refresh_ttl_seconds(), 120);
        assert_eq!(config.leeway_seconds(), 5);
        assert_eq!(config.login_limit(), 2);
        assert_eq!(config.api_limit(), 10);
    }
}
