use clap::{Arg, ArgAction, ArgMatches, Command};
use std::time::Duration;

pub const ARG_PORT: &str = "port";
pub const ARG_ALLOWED_ORIGIN: &str = "allowed-origin";
pub const ARG_REQUEST_TIMEOUT: &str = "request-timeout-seconds";
pub const ARG_UPSTREAM_TIMEOUT: &str = "upstream-timeout-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("SESAME_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_ALLOWED_ORIGIN)
                .long(ARG_ALLOWED_ORIGIN)
                .help("Origin allowed by CORS (repeatable, any origin when unset)")
                .env("SESAME_ALLOWED_ORIGINS")
                .value_delimiter(',')
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(ARG_REQUEST_TIMEOUT)
                .long(ARG_REQUEST_TIMEOUT)
                .help("Upper bound for handling one inbound request")
                .env("SESAME_REQUEST_TIMEOUT_SECONDS")
                .default_value("30")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_TIMEOUT)
                .long(ARG_UPSTREAM_TIMEOUT)
                .help("Timeout for each call to the data platform, email provider or image host")
                .env("SESAME_UPSTREAM_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

#[derive(Debug, Clone)]
pub struct Options {
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout: Duration,
    pub upstream_timeout: Duration,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let seconds = |arg: &str, default: u64| {
            Duration::from_secs(matches.get_one::<u64>(arg).copied().unwrap_or(default))
        };

        Self {
            port: matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080),
            allowed_origins: matches
                .get_many::<String>(ARG_ALLOWED_ORIGIN)
                .map(|origins| {
                    origins
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            request_timeout: seconds(ARG_REQUEST_TIMEOUT, 30),
            upstream_timeout: seconds(ARG_UPSTREAM_TIMEOUT, 10),
        }
    }
}
