//! # Acces (move-acces authentication backend)
//!
//! `acces` is the authentication and session-security service for the
//! move-acces mobile app. It verifies credentials, issues and validates
//! signed access/refresh tokens, revokes refresh tokens on logout, and
//! rate-limits abusive clients.
//!
//! ## Tokens
//!
//! Tokens are HS256 JWTs signed with a single shared secret. The token kind
//! (`access` or `refresh`) is part of the signed payload, so a refresh token
//! can never be replayed as an access token or vice versa. Access tokens are
//! short-lived; refresh tokens only mint new access tokens and are not
//! rotated.
//!
//! ## Revocation & rate limiting
//!
//! Logout blacklists the refresh token in Redis for exactly its remaining
//! lifetime. Rate limiting is a fixed-window counter per `(scope, client-ip)`
//! pair, incremented atomically in Redis so concurrent requests cannot slip
//! past the limit. Redis is the serialization point for both; when it is
//! unreachable the service fails closed.
//!
//! ## Anti-enumeration
//!
//! Login and refresh failures are indistinguishable in the response
//! regardless of root cause: unknown email, wrong password, malformed,
//! expired, wrong-kind and revoked tokens all map to the same generic `401`.

pub mod api;
pub mod audit;
pub mod cli;
pub mod kv;
pub mod password;
pub mod rate_limit;
pub mod revocation;
pub mod token;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
