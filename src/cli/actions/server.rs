use crate::{api, api::handlers::auth::AuthConfig, cli::commands::auth};
use anyhow::Result;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub redis_url: String,
    pub cors_origin: Option<String>,
    pub auth: auth::Options,
}

/// Handle the server action
pub async fn execute(args: Args) -> Result<()> {
    let config = AuthConfig::default()
        .with_access_ttl_seconds(args.auth.access_ttl_seconds)
        .with_refresh_ttl_seconds(args.auth.refresh_ttl_seconds)
        .with_leeway_seconds(args.auth.leeway_seconds)
        .with_login_limit(args.auth.login_limit)
        .with_api_limit(args.auth.api_limit);

    api::serve(
        args.port,
        &args.dsn,
        &args.redis_url,
        args.cors_origin.as_deref(),
        &args.auth.jwt_secret,
        config,
    )
    .await
}
