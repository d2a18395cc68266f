use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_STORE_URL: &str = "store-url";
pub const ARG_STORE_SERVICE_KEY: &str = "store-service-key";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_STORE_URL)
                .long(ARG_STORE_URL)
                .help("Base URL of the data platform (REST, RPC and auth admin API)")
                .env("SESAME_STORE_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_STORE_SERVICE_KEY)
                .long(ARG_STORE_SERVICE_KEY)
                .help("Service-role key used for every data platform call")
                .env("SESAME_STORE_SERVICE_KEY")
                .hide_env_values(true)
                .required(true),
        )
}

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub service_key: SecretString,
}

impl Options {
    /// # Errors
    /// Returns an error if either argument is missing or blank.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let url = matches
            .get_one::<String>(ARG_STORE_URL)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .context("missing required argument: --store-url")?;
        let service_key = matches
            .get_one::<String>(ARG_STORE_SERVICE_KEY)
            .filter(|key| !key.trim().is_empty())
            .map(|key| SecretString::from(key.clone()))
            .context("missing required argument: --store-service-key")?;

        Ok(Self { url, service_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn parse_from_env() {
        temp_env::with_vars(
            [
                ("SESAME_STORE_URL", Some("https://db.example.com ")),
                ("SESAME_STORE_SERVICE_KEY", Some("service-role")),
            ],
            || {
                let matches = with_args(Command::new("sesame")).get_matches_from(["sesame"]);
                let result = Options::parse(&matches);
                assert!(result.is_ok());
                if let Ok(options) = result {
                    assert_eq!(options.url, "https://db.example.com");
                    assert_eq!(options.service_key.expose_secret(), "service-role");
                }
            },
        );
    }

    #[test]
    fn blank_service_key_is_rejected() {
        temp_env::with_vars(
            [
                ("SESAME_STORE_URL", Some("https://db.example.com")),
                ("SESAME_STORE_SERVICE_KEY", Some("   ")),
            ],
            || {
                let matches = with_args(Command::new("sesame")).get_matches_from(["sesame"]);
                let result = Options::parse(&matches);
                assert!(result.is_err());
            },
        );
    }

    #[test]
    fn debug_redacts_service_key() {
        let options = Options {
            url: "https://db.example.com".to_string(),
            service_key: SecretString::from("super-secret"),
        };
        assert!(!format!("{options:?}").contains("super-secret"));
    }
}
