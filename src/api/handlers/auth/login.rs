//! Login endpoint.
//!
//! Order matters: the limiter runs before any credential work so a flooding
//! client never reaches bcrypt or the database, and the response for an
//! unknown email is byte-identical to the one for a wrong password.

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
use super::types::{LoginRequest, LoginResponse, UserInfo};
use super::utils::{extract_client_ip, extract_user_agent, normalize_email};
use crate::audit::AuditAction;
use crate::password;
use crate::rate_limit::RateScope;

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Incorrect email or password", body = super::types::ErrorResponse),
        (status = 429, description = "Too many login attempts", body = super::types::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let client_ip = extract_client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let user_agent = extract_user_agent(&headers);

    // Limit before touching credential storage.
    if let Err(err) = state
        .limiter()
        .check_and_increment(RateScope::Login, &client_ip, state.config().login_limit())
        .await
    {
        return AuthError::from(err).into_response();
    }

    let email = normalize_email(&request.email);

    let credential = match state.users().find_credential(&email).await {
        Ok(credential) => credential,
        Err(err) => return AuthError::from(err).into_response(),
    };

    let verified = match credential {
        Some(credential) => {
            let plain = request.password;
            let result = tokio::task::spawn_blocking(move || {
                password::verify(&plain, &credential.password_hash)
            })
            .await;
            match result {
                Ok(verified) => verified,
                Err(err) => {
                    error!("Password verification task failed: {err}");
                    false
                }
            }
        }
        None => false,
    };

    if !verified {
        debug!("Login failed for {email}");
        state.audit().record(
            AuditAction::LoginFailed,
            None,
            Some(client_ip),
            user_agent,
            Some(format!("email: {email}")),
        );
        return AuthError::InvalidCredentials.into_response();
    }

    let user = match state.users().find_user(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            // Credential row without a profile row; reject like any bad login.
            state.audit().record(
                AuditAction::LoginFailed,
                None,
                Some(client_ip),
                user_agent,
                Some(format!("email: {email}, missing user row")),
            );
            return AuthError::InvalidCredentials.into_response();
        }
        Err(err) => return AuthError::from(err).into_response(),
    };

    let issued = state
        .tokens()
        .issue_access(&user.email)
        .and_then(|access| Ok((access, state.tokens().issue_refresh(&user.email)?)));
    let (access_token, refresh_token) = match issued {
        Ok(tokens) => tokens,
        Err(err) => {
            error!("Failed to sign tokens: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
                .into_response();
        }
    };

    state.audit().record(
        AuditAction::Login,
        Some(user.user_id),
        Some(client_ip),
        user_agent,
        None,
    );

    let response = LoginResponse {
        access_token,
        refresh_token,
        expires_in: state.tokens().access_ttl_seconds(),
        user: UserInfo {
            user_id: user.user_id,
            email: user.email,
            prenom: user.prenom,
            nom: user.nom,
        },
    };
    (StatusCode::OK, Json(response)).into_response()
}
