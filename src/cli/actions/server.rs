use crate::{
    api::{self, ServerConfig, Services},
    avatar::AvatarFlow,
    cli::commands::{avatar, email, http, store},
    email::{HttpMailer, LogMailer, Mailer, SmtpMailer},
    images::{CloudinaryHost, DisabledImageHost, ImageHost},
    platform::{IdentityAdmin, PlatformClient, ProfileStore, ResetCodeStore, RoomPresence},
    reset::ResetFlow,
};
use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct Args {
    pub http: http::Options,
    pub store: store::Options,
    pub email: email::Options,
    pub avatar: avatar::Options,
}

/// Execute the server action.
/// # Errors
/// Returns an error if a collaborator client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("server arguments: {args:?}");

    let timeout = args.http.upstream_timeout;
    let platform = PlatformClient::new(&args.store.url, args.store.service_key, timeout)
        .context("Invalid data platform configuration")?;

    let mailer = build_mailer(args.email, timeout)?;
    let images = build_image_host(args.avatar.image_host, timeout)?;
    if args.avatar.secret.is_none() {
        warn!("no avatar secret configured, avatar updates will be refused");
    }

    let services = Services {
        reset: Arc::new(ResetFlow::new(
            ResetCodeStore::new(platform.clone()),
            IdentityAdmin::new(platform.clone()),
            mailer,
        )),
        avatar: Arc::new(AvatarFlow::new(
            ProfileStore::new(platform.clone()),
            images,
            args.avatar.secret,
        )),
        rooms: RoomPresence::new(platform.clone()),
        platform,
    };

    let config = ServerConfig {
        port: args.http.port,
        allowed_origins: args.http.allowed_origins,
        request_timeout: args.http.request_timeout,
    };

    api::new(config, services).await
}

fn build_mailer(options: email::Options, timeout: Duration) -> Result<Arc<dyn Mailer>> {
    let mailer: Arc<dyn Mailer> = match options {
        email::Options::Log => {
            warn!("email provider is 'log', reset codes are written to the debug log only");
            Arc::new(LogMailer)
        }
        email::Options::Smtp { url, from } => {
            info!(from = %from, "sending email through SMTP");
            Arc::new(SmtpMailer::new(&url, &from, timeout)?)
        }
        email::Options::Http { url, api_key, from } => {
            info!(url = %url, from = %from, "sending email through HTTP API");
            Arc::new(HttpMailer::new(url, api_key, from, timeout)?)
        }
    };
    Ok(mailer)
}

fn build_image_host(options: avatar::ImageHostOptions, timeout: Duration) -> Result<Arc<dyn ImageHost>> {
    let host: Arc<dyn ImageHost> = match options {
        avatar::ImageHostOptions::Disabled => Arc::new(DisabledImageHost),
        avatar::ImageHostOptions::Cloudinary {
            base_url,
            cloud_name,
            api_key,
            api_secret,
        } => Arc::new(CloudinaryHost::new(
            &base_url, cloud_name, api_key, api_secret, timeout,
        )?),
    };
    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn builds_every_mailer() {
        let timeout = Duration::from_secs(1);
        assert!(build_mailer(email::Options::Log, timeout).is_ok());
        assert!(
            build_mailer(
                email::Options::Http {
                    url: "https://api.mail.example/emails".to_string(),
                    api_key: SecretString::from("key"),
                    from: "no-reply@sesame.dev".to_string(),
                },
                timeout,
            )
            .is_ok()
        );
        assert!(
            build_mailer(
                email::Options::Smtp {
                    url: SecretString::from("not a url"),
                    from: "no-reply@sesame.dev".to_string(),
                },
                timeout,
            )
            .is_err()
        );
    }

    #[test]
    fn builds_image_hosts() {
        let timeout = Duration::from_secs(1);
        assert!(build_image_host(avatar::ImageHostOptions::Disabled, timeout).is_ok());
        assert!(
            build_image_host(
                avatar::ImageHostOptions::Cloudinary {
                    base_url: "https://api.cloudinary.com".to_string(),
                    cloud_name: "demo".to_string(),
                    api_key: "123".to_string(),
                    api_secret: SecretString::from("shh"),
                },
                timeout,
            )
            .is_ok()
        );
    }
}
