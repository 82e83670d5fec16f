//! Bearer-token authentication for protected endpoints.

use axum::http::HeaderMap;

use super::error::AuthError;
use super::state::AuthState;
use super::utils::bearer_token;
use crate::token::{Claims, TokenKind};

/// Resolve the `Authorization: Bearer` header into validated access-token
/// claims. Every failure — missing header, bad signature, expiry, a refresh
/// token presented as access — maps to the same generic rejection.
pub(crate) fn authenticate(headers: &HeaderMap, state: &AuthState) -> Result<Claims, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::TokenRejected)?;
    state
        .tokens()
        .validate(&token, TokenKind::Access)
        .map_err(|_| AuthError::TokenRejected)
}
