//! Refresh and logout endpoints.
//!
//! A refresh token moves through `valid` → `expired` (clock) or `revoked`
//! (logout); both terminal states answer the caller identically. The
//! distinction only survives in logs and audit detail, so a revoked token
//! cannot be fingerprinted from the outside.

use axum::{
    Json,
    extract::{ConnectInfo, Extension},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error};

use super::error::AuthError;
use super::state::AuthState;
use super::types::{LogoutRequest, RefreshRequest, RefreshResponse};
use super::utils::{extract_client_ip, extract_user_agent};
use crate::audit::AuditAction;
use crate::token::{TokenKind, remaining_ttl_seconds};

#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token issued", body = RefreshResponse),
        (status = 401, description = "Invalid or expired token", body = super::types::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn refresh(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let claims = match state
        .tokens()
        .validate(&request.refresh_token, TokenKind::Refresh)
    {
        Ok(claims) => claims,
        Err(reason) => {
            debug!("Refresh token rejected: {reason}");
            return AuthError::TokenRejected.into_response();
        }
    };

    // Fail closed: a store failure here rejects the request rather than
    // trusting an unverifiable revocation state.
    match state.revocations().is_revoked(&request.refresh_token).await {
        Ok(false) => {}
        Ok(true) => {
            debug!("Refresh token revoked for {}", claims.sub);
            return AuthError::TokenRejected.into_response();
        }
        Err(err) => return AuthError::from(err).into_response(),
    }

    // A new access token only; the refresh token is not rotated.
    let access_token = match state.tokens().issue_access(&claims.sub) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to sign access token: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
                .into_response();
        }
    };

    let response = RefreshResponse {
        access_token,
        expires_in: state.tokens().access_ttl_seconds(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 204, description = "Refresh token revoked"),
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<LogoutRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    // Decode defensively: an authentic token yields its claimed expiry (a
    // zero remaining lifetime makes revocation a no-op); anything else is
    // blacklisted for the full configured refresh lifetime.
    let (ttl_seconds, subject) = match state.tokens().decode_any(&request.refresh_token) {
        Ok(claims) if claims.kind == TokenKind::Refresh => {
            (remaining_ttl_seconds(&claims), Some(claims.sub))
        }
        Ok(_) | Err(_) => (
            u64::try_from(state.tokens().refresh_ttl_seconds()).unwrap_or(0),
            None,
        ),
    };

    // Revoking twice, or revoking an already-expired token, is not an error;
    // an unreachable store is.
    if let Err(err) = state
        .revocations()
        .revoke(&request.refresh_token, ttl_seconds)
        .await
    {
        return AuthError::from(err).into_response();
    }

    if let Some(email) = subject {
        let client_ip = extract_client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));
        let user_agent = extract_user_agent(&headers);
        match state.users().find_user(&email).await {
            Ok(Some(user)) => {
                state.audit().record(
                    AuditAction::Logout,
                    Some(user.user_id),
                    Some(client_ip),
                    user_agent,
                    None,
                );
            }
            Ok(None) => {}
            Err(err) => {
                // Audit attribution is best-effort; the revocation stands.
                error!("Failed to resolve logout subject: {err}");
            }
        }
    }

    StatusCode::NO_CONTENT.into_response()
}
