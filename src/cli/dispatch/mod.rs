//! Maps validated CLI matches to the action to run.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{avatar, email, http, store};
use anyhow::Result;

/// Build the server action from parsed arguments.
///
/// # Errors
/// Returns an error if required arguments are missing or a provider is
/// selected without its prerequisites.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server(Args {
        http: http::Options::parse(matches),
        store: store::Options::parse(matches)?,
        email: email::Options::parse(matches)?,
        avatar: avatar::Options::parse(matches)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: [&str; 13] = [
        "SESAME_PORT",
        "SESAME_STORE_URL",
        "SESAME_STORE_SERVICE_KEY",
        "SESAME_EMAIL_PROVIDER",
        "SESAME_EMAIL_FROM",
        "SESAME_SMTP_URL",
        "SESAME_EMAIL_API_URL",
        "SESAME_EMAIL_API_KEY",
        "SESAME_AVATAR_SECRET",
        "SESAME_IMAGE_HOST",
        "SESAME_CLOUDINARY_CLOUD_NAME",
        "SESAME_CLOUDINARY_API_KEY",
        "SESAME_CLOUDINARY_API_SECRET",
    ];

    /// Every sesame variable unset except the given overrides.
    fn env(overrides: &[(&'static str, &'static str)]) -> Vec<(&'static str, Option<&'static str>)> {
        ALL_VARS
            .iter()
            .map(|key| {
                let value = overrides
                    .iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, value)| *value);
                (*key, value)
            })
            .collect()
    }

    #[test]
    fn minimal_configuration() {
        let vars = env(&[
            ("SESAME_STORE_URL", "https://db.example.com"),
            ("SESAME_STORE_SERVICE_KEY", "service-role"),
            ("SESAME_EMAIL_PROVIDER", "log"),
        ]);
        temp_env::with_vars(vars, || {
            let matches = crate::cli::commands::new().get_matches_from(["sesame"]);
            let result = handler(&matches);
            assert!(result.is_ok());
            if let Ok(Action::Server(args)) = result {
                assert_eq!(args.http.port, 8080);
                assert_eq!(args.store.url, "https://db.example.com");
                assert!(matches!(args.email, email::Options::Log));
                assert!(args.avatar.secret.is_none());
            }
        });
    }

    #[test]
    fn unset_email_provider_fails_at_startup() {
        let vars = env(&[
            ("SESAME_STORE_URL", "https://db.example.com"),
            ("SESAME_STORE_SERVICE_KEY", "service-role"),
        ]);
        temp_env::with_vars(vars, || {
            let result = crate::cli::commands::new().try_get_matches_from(["sesame"]);
            assert!(result.is_err_and(|err| err.to_string().contains("--email-provider")));
        });
    }

    #[test]
    fn smtp_without_url_fails_at_startup() {
        let vars = env(&[
            ("SESAME_STORE_URL", "https://db.example.com"),
            ("SESAME_STORE_SERVICE_KEY", "service-role"),
            ("SESAME_EMAIL_PROVIDER", "smtp"),
            ("SESAME_EMAIL_FROM", "no-reply@sesame.dev"),
        ]);
        temp_env::with_vars(vars, || {
            let matches = crate::cli::commands::new().get_matches_from(["sesame"]);
            let result = handler(&matches);
            assert!(result.is_err());
            if let Err(err) = result {
                assert!(
                    err.to_string()
                        .contains("missing required argument: --smtp-url")
                );
            }
        });
    }
}
