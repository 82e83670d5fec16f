//! Auth-related CLI arguments: signing secret, token TTLs, and rate limits.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_ACCESS_TTL: &str = "access-ttl-seconds";
pub const ARG_REFRESH_TTL: &str = "refresh-ttl-seconds";
pub const ARG_LEEWAY: &str = "leeway-seconds";
pub const ARG_LOGIN_LIMIT: &str = "login-limit";
pub const ARG_API_LIMIT: &str = "api-limit";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Shared secret for signing access and refresh tokens")
                .env("ACCES_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_ACCESS_TTL)
                .long(ARG_ACCESS_TTL)
                .help("Access token lifetime in seconds")
                .env("ACCES_ACCESS_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TTL)
                .long(ARG_REFRESH_TTL)
                .help("Refresh token lifetime in seconds")
                .env("ACCES_REFRESH_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_LEEWAY)
                .long(ARG_LEEWAY)
                .help("Clock-skew leeway in seconds when validating token expiry")
                .env("ACCES_LEEWAY_SECONDS")
                .default_value("0")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_LOGIN_LIMIT)
                .long(ARG_LOGIN_LIMIT)
                .help("Login attempts allowed per client IP per minute")
                .env("ACCES_LOGIN_LIMIT")
                .default_value("5")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_API_LIMIT)
                .long(ARG_API_LIMIT)
                .help("API requests allowed per client IP per 5 minutes")
                .env("ACCES_API_LIMIT")
                .default_value("100")
                .value_parser(clap::value_parser!(i64)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub jwt_secret: SecretString,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
    pub leeway_seconds: u64,
    pub login_limit: i64,
    pub api_limit: i64,
}

impl Options {
    /// Extract auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if the required signing secret is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let jwt_secret = matches
            .get_one::<String>(ARG_JWT_SECRET)
            .cloned()
            .context("missing required argument: --jwt-secret")?;

        Ok(Self {
            jwt_secret: SecretString::from(jwt_secret),
            access_ttl_seconds: matches
                .get_one::<i64>(ARG_ACCESS_TTL)
                .copied()
                .unwrap_or(900),
            refresh_ttl_seconds: matches
                .get_one::<i64>(ARG_REFRESH_TTL)
                .copied()
                .unwrap_or(86_400),
            leeway_seconds: matches.get_one::<u64>(ARG_LEEWAY).copied().unwrap_or(0),
            login_limit: matches.get_one::<i64>(ARG_LOGIN_LIMIT).copied().unwrap_or(5),
            api_limit: matches.get_one::<i64>(ARG_API_LIMIT).copied().unwrap_or(100),
        })
    }
}
