//! Error taxonomy for the auth flows and its HTTP mapping.
//!
//! Validation failures collapse into generic responses so a caller cannot
//! tell an unknown email from a wrong password, or a revoked token from an
//! expired one. Infrastructure failures surface as 500s and are logged; they
//! are never masked as "not limited" or "not revoked".

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use super::types::ErrorResponse;
use crate::kv::KvError;
use crate::rate_limit::RateLimitError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,
    #[error("Rate limit exceeded. Try again later.")]
    RateLimited { retry_after: u64 },
    #[error("Invalid or expired token")]
    TokenRejected,
    #[error("store unavailable")]
    StoreUnavailable(#[source] anyhow::Error),
}

impl From<KvError> for AuthError {
    fn from(err: KvError) -> Self {
        Self::StoreUnavailable(err.into())
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        Self::StoreUnavailable(err.into())
    }
}

impl From<RateLimitError> for AuthError {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::Limited { retry_after } => Self::RateLimited { retry_after },
            RateLimitError::Store(err) => err.into(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidCredentials | Self::TokenRejected => {
                let body = Json(ErrorResponse::new(self.to_string()));
                (StatusCode::UNAUTHORIZED, body).into_response()
            }
            Self::RateLimited { retry_after } => {
                let body = Json(ErrorResponse::new(self.to_string()));
                let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
                if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                    response.headers_mut().insert(RETRY_AFTER, value);
                }
                response
            }
            Self::StoreUnavailable(err) => {
                error!("Store unavailable: {err:#}");
                let body = Json(ErrorResponse::new("Internal server error".to_string()));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    async fn response_parts(err: AuthError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn invalid_credentials_is_generic_401() {
        let (status, body) = response_parts(AuthError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Incorrect email or password");
    }

    #[tokio::test]
    async fn token_rejected_is_generic_401() {
        let (status, body) = response_parts(AuthError::TokenRejected).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn rate_limited_carries_retry_after() {
        let response = AuthError::RateLimited { retry_after: 60 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok()),
            Some("60")
        );
    }

    #[tokio::test]
    async fn store_failure_is_masked_500() {
        let (status, body) = response_parts(AuthError::StoreUnavailable(anyhow!("redis down"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Internal server error");
    }
}
