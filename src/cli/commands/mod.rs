use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub mod auth;
pub mod logging;

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("acces")
        .about("Authentication and session security service")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("ACCES_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env("ACCES_DSN")
                .required(true),
        )
        .arg(
            Arg::new("redis-url")
                .long("redis-url")
                .help("Redis connection URL, example: redis://localhost:6379")
                .env("ACCES_REDIS_URL")
                .required(true),
        )
        .arg(
            Arg::new("cors-origin")
                .long("cors-origin")
                .help("Browser origin allowed to call the API")
                .env("ACCES_CORS_ORIGIN"),
        );

    let command = auth::with_args(command);

    logging::with_args(command)
}
