//! Registration endpoint.

use axum::{
    Json,
    extract::{ConnectInfo, Extension},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::error;

use super::error::AuthError;
use super::state::AuthState;
use super::storage::SignupOutcome;
use super::types::{RegisterRequest, UserInfo};
use super::utils::{extract_client_ip, extract_user_agent, normalize_email, valid_email};
use crate::audit::AuditAction;
use crate::password;

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserInfo),
        (status = 400, description = "Invalid email", body = super::types::ErrorResponse),
        (status = 409, description = "Email already registered", body = super::types::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn register(
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    let plain = request.password.clone();
    let password_hash = match tokio::task::spawn_blocking(move || password::hash(&plain)).await {
        Ok(Ok(hash)) => hash,
        Ok(Err(err)) => {
            error!("Failed to hash password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
                .into_response();
        }
        Err(err) => {
            error!("Password hashing task failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
                .into_response();
        }
    };

    let user = match state
        .users()
        .insert_user_with_credential(&request, &email, &password_hash)
        .await
    {
        Ok(SignupOutcome::Created(user)) => user,
        Ok(SignupOutcome::Conflict) => {
            return (
                StatusCode::CONFLICT,
                "User with this email already exists".to_string(),
            )
                .into_response();
        }
        Err(err) => return AuthError::from(err).into_response(),
    };

    let client_ip = extract_client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    state.audit().record(
        AuditAction::Register,
        Some(user.user_id),
        Some(client_ip),
        extract_user_agent(&headers),
        None,
    );

    let info = UserInfo {
        user_id: user.user_id,
        email: user.email,
        prenom: user.prenom,
        nom: user.nom,
    };
    (StatusCode::CREATED, Json(info)).into_response()
}
