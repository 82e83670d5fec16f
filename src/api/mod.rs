//! HTTP surface: router construction, middleware layers, and server startup.

use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{
        HeaderName, HeaderValue, Method, Request,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};
use secrecy::SecretString;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;

pub mod handlers;

use handlers::auth::storage::UserStore;
use handlers::auth::{AuthConfig, AuthState};
use crate::audit::{AuditRecorder, AuditSink};
use crate::kv::{Kv, RedisStore};

/// Build the application router around pre-constructed state.
///
/// Split out from `serve` so tests can drive the exact production routing
/// and middleware against a memory-backed store.
#[must_use]
pub fn router(state: Arc<AuthState>, pool: PgPool, cors_origin: Option<&str>) -> Router {
    let mut cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST]);
    if let Some(origin) = origin_header(cors_origin) {
        cors = cors.allow_origin(AllowOrigin::exact(origin)).allow_credentials(true);
    }

    Router::new()
        .route("/auth/register", post(handlers::auth::register::register))
        .route("/auth/login", post(handlers::auth::login::login))
        .route("/auth/refresh", post(handlers::auth::session::refresh))
        .route("/auth/logout", post(handlers::auth::session::logout))
        .route("/auth/me", get(handlers::me::me))
        .route("/health", get(handlers::health::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &Request<Body>| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(state))
                .layer(Extension(pool)),
        )
}

/// Connect to Postgres and Redis, build the shared auth state, and serve.
///
/// # Errors
/// Returns an error if either backend connection or the listener fails.
pub async fn serve(
    port: u16,
    dsn: &str,
    redis_url: &str,
    cors_origin: Option<&str>,
    jwt_secret: &SecretString,
    config: AuthConfig,
) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(dsn)
        .await
        .context("Failed to connect to database")?;

    let store = RedisStore::connect(redis_url)
        .await
        .context("Failed to connect to Redis")?;
    let kv = Arc::new(Kv::Redis(store));

    let state = Arc::new(AuthState::new(
        config,
        jwt_secret,
        kv,
        UserStore::Postgres(pool.clone()),
        AuditRecorder::new(AuditSink::Postgres(pool.clone())),
    ));
    let app = router(state, pool, cors_origin);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn origin_header(cors_origin: Option<&str>) -> Option<HeaderValue> {
    cors_origin.and_then(|origin| HeaderValue::from_str(origin.trim_end_matches('/')).ok())
}

fn make_span(request: &Request<Body>) -> Span {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");
    info_span!(
        "http.request",
        method = %request.method(),
        path,
        request_id
    )
}
