//! Access-token-protected profile endpoint.
//!
//! Exists as the protected surface of the API: it demonstrates the
//! `Authorization: Bearer` contract and carries the general `api` rate
//! limit. Profile editing lives elsewhere.

use axum::{
    Json,
    extract::{ConnectInfo, Extension},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;

use super::auth::{AuthError, AuthState, extract_client_ip};
use super::auth::{principal::authenticate, types::UserInfo};
use crate::rate_limit::RateScope;

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Authenticated user profile", body = UserInfo),
        (status = 401, description = "Invalid or expired token", body = super::auth::types::ErrorResponse),
        (status = 429, description = "Too many requests", body = super::auth::types::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    state: Extension<Arc<AuthState>>,
) -> Response {
    let claims = match authenticate(&headers, &state) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };

    let client_ip = extract_client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    if let Err(err) = state
        .limiter()
        .check_and_increment(RateScope::Api, &client_ip, state.config().api_limit())
        .await
    {
        return AuthError::from(err).into_response();
    }

    match state.users().find_user(&claims.sub).await {
        Ok(Some(user)) => {
            let info = UserInfo {
                user_id: user.user_id,
                email: user.email,
                prenom: user.prenom,
                nom: user.nom,
            };
            (StatusCode::OK, Json(info)).into_response()
        }
        // Token subject no longer exists; indistinguishable from a bad token.
        Ok(None) => AuthError::TokenRejected.into_response(),
        Err(err) => AuthError::from(err).into_response(),
    }
}
