//! Signed access/refresh token issuance and validation.
//!
//! Tokens are HS256 JWTs carrying `{sub, exp, iat, type}`. The kind tag lives
//! inside the signed payload: a refresh token presented where an access token
//! is expected (or vice versa) fails validation even with a valid signature.
//!
//! This module is stateless beyond the shared secret. Revocation is not its
//! concern; the refresh handler combines `validate` with a blacklist lookup.

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
    errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Signed token payload. Fixed shape; unknown or missing fields fail decode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

/// Why a token was rejected. Callers collapse every reason into the same
/// generic unauthorized response; the distinction exists for audit detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenRejected {
    #[error("malformed token")]
    Malformed,
    #[error("bad signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("wrong token kind")]
    WrongKind,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    leeway_seconds: u64,
}

impl TokenService {
    #[must_use]
    pub fn new(
        secret: &SecretString,
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
        leeway_seconds: u64,
    ) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl_seconds,
            refresh_ttl_seconds,
            leeway_seconds,
        }
    }

    #[must_use]
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    /// Issue a short-lived access token for `subject`.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_access(&self, subject: &str) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(subject, TokenKind::Access, Utc::now().timestamp())
    }

    /// Issue a refresh token for `subject`.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_refresh(&self, subject: &str) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(subject, TokenKind::Refresh, Utc::now().timestamp())
    }

    fn issue_at(
        &self,
        subject: &str,
        kind: TokenKind,
        now: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_seconds,
            TokenKind::Refresh => self.refresh_ttl_seconds,
        };
        let claims = Claims {
            sub: subject.to_string(),
            exp: now + ttl,
            iat: now,
            kind,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// Verify signature, expiry (with configured leeway), and kind tag.
    ///
    /// # Errors
    /// Returns the rejection reason; callers map all reasons to the same
    /// external unauthorized response.
    pub fn validate(&self, raw: &str, expected_kind: TokenKind) -> Result<Claims, TokenRejected> {
        let claims = self.decode(raw, true)?;
        if claims.kind != expected_kind {
            return Err(TokenRejected::WrongKind);
        }
        Ok(claims)
    }

    /// Decode with signature verification but without the expiry check.
    ///
    /// Used by logout, which still revokes expired-but-authentic tokens
    /// (a no-op once the remaining lifetime is zero) and wants the claimed
    /// subject for the audit record.
    ///
    /// # Errors
    /// Returns `Malformed` or `BadSignature`; never `Expired`.
    pub fn decode_any(&self, raw: &str) -> Result<Claims, TokenRejected> {
        self.decode(raw, false)
    }

    fn decode(&self, raw: &str, validate_exp: bool) -> Result<Claims, TokenRejected> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway_seconds;
        validation.validate_exp = validate_exp;
        validation.set_required_spec_claims(&["exp"]);

        let data: TokenData<Claims> =
            decode(raw, &self.decoding_key, &validation).map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenRejected::Expired,
                ErrorKind::InvalidSignature => TokenRejected::BadSignature,
                _ => TokenRejected::Malformed,
            })?;
        Ok(data.claims)
    }
}

/// Seconds until `claims.exp`, clamped to zero once passed.
#[must_use]
pub fn remaining_ttl_seconds(claims: &Claims) -> u64 {
    let remaining = claims.exp - Utc::now().timestamp();
    u64::try_from(remaining).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&SecretString::from("test-secret"), 900, 86_400, 0)
    }

    #[test]
    fn issued_access_token_validates() {
        let tokens = service();
        let raw = tokens.issue_access("a@b.com").unwrap();
        let claims = tokens.validate(&raw, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, "a@b.com");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn refresh_token_rejected_as_access() {
        let tokens = service();
        let raw = tokens.issue_refresh("a@b.com").unwrap();
        assert_eq!(
            tokens.validate(&raw, TokenKind::Access),
            Err(TokenRejected::WrongKind)
        );
    }

    #[test]
    fn access_token_rejected_as_refresh() {
        let tokens = service();
        // Signature is valid and the token is unexpired; only the kind differs.
        let raw = tokens.issue_access("a@b.com").unwrap();
        assert_eq!(
            tokens.validate(&raw, TokenKind::Refresh),
            Err(TokenRejected::WrongKind)
        );
    }

    #[test]
    fn expired_token_rejected() {
        let tokens = service();
        let raw = tokens
            .issue_at("a@b.com", TokenKind::Access, Utc::now().timestamp() - 1_000)
            .unwrap();
        assert_eq!(
            tokens.validate(&raw, TokenKind::Access),
            Err(TokenRejected::Expired)
        );
    }

    #[test]
    fn leeway_tolerates_small_skew() {
        let tokens = TokenService::new(&SecretString::from("test-secret"), 900, 86_400, 120);
        let raw = tokens
            .issue_at("a@b.com", TokenKind::Access, Utc::now().timestamp() - 960)
            .unwrap();
        assert!(tokens.validate(&raw, TokenKind::Access).is_ok());
    }

    #[test]
    fn foreign_signature_rejected() {
        let tokens = service();
        let other = TokenService::new(&SecretString::from("other-secret"), 900, 86_400, 0);
        let raw = other.issue_access("a@b.com").unwrap();
        assert_eq!(
            tokens.validate(&raw, TokenKind::Access),
            Err(TokenRejected::BadSignature)
        );
    }

    #[test]
    fn garbage_rejected_as_malformed() {
        let tokens = service();
        assert_eq!(
            tokens.validate("not-a-token", TokenKind::Access),
            Err(TokenRejected::Malformed)
        );
    }

    #[test]
    fn decode_any_accepts_expired_tokens() {
        let tokens = service();
        let raw = tokens
            .issue_at("a@b.com", TokenKind::Refresh, Utc::now().timestamp() - 100_000)
            .unwrap();
        let claims = tokens.decode_any(&raw).unwrap();
        assert_eq!(claims.sub, "a@b.com");
        assert_eq!(remaining_ttl_seconds(&claims), 0);
    }

    #[test]
    fn decode_any_still_checks_signature() {
        let tokens = service();
        let other = TokenService::new(&SecretString::from("other-secret"), 900, 86_400, 0);
        let raw = other.issue_refresh("a@b.com").unwrap();
        assert_eq!(tokens.decode_any(&raw), Err(TokenRejected::BadSignature));
    }

    #[test]
    fn remaining_ttl_tracks_expiry() {
        let tokens = service();
        let raw = tokens.issue_refresh("a@b.com").unwrap();
        let claims = tokens.validate(&raw, TokenKind::Refresh).unwrap();
        let remaining = remaining_ttl_seconds(&claims);
        assert!(remaining > 86_390 && remaining <= 86_400);
    }
}
