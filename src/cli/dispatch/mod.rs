use crate::cli::{
    actions::{Action, server},
    commands::auth,
};
use anyhow::Result;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let auth = auth::Options::parse(matches)?;

    Ok(Action::Server(server::Args {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        dsn: matches
            .get_one("dsn")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --dsn"))?,
        redis_url: matches
            .get_one("redis-url")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --redis-url"))?,
        cors_origin: matches.get_one::<String>("cors-origin").cloned(),
        auth,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn test_handler_server_action() {
        let matches = commands::new()
            .try_get_matches_from(vec![
                "acces",
                "--dsn",
                "postgres://localhost:5432/acces",
                "--redis-url",
                "redis://localhost:6379",
                "--jwt-secret",
                "s3cret",
                "--cors-origin",
                "https://app.example.com",
                "--login-limit",
                "3",
            ])
            .unwrap();

        let Action::Server(args) = handler(&matches).unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.dsn, "postgres://localhost:5432/acces");
        assert_eq!(args.redis_url, "redis://localhost:6379");
        assert_eq!(args.cors_origin.as_deref(), Some("https://app.example.com"));
        assert_eq!(args.auth.jwt_secret.expose_secret(), "s3cret");
        assert_eq!(args.auth.login_limit, 3);
        assert_eq!(args.auth.api_limit, 100);
    }
}
