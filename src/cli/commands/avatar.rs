use crate::images::DEFAULT_CLOUDINARY_URL;
use anyhow::{Context, Result, bail};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_AVATAR_SECRET: &str = "avatar-secret";
pub const ARG_IMAGE_HOST: &str = "image-host";
pub const ARG_CLOUDINARY_CLOUD_NAME: &str = "cloudinary-cloud-name";
pub const ARG_CLOUDINARY_API_KEY: &str = "cloudinary-api-key";
pub const ARG_CLOUDINARY_API_SECRET: &str = "cloudinary-api-secret";
pub const ARG_CLOUDINARY_URL: &str = "cloudinary-url";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_AVATAR_SECRET)
                .long(ARG_AVATAR_SECRET)
                .help("Shared secret expected in the x-avatar-secret header")
                .long_help(
                    "Shared secret expected in the x-avatar-secret header. When unset, avatar updates are refused as misconfigured.",
                )
                .env("SESAME_AVATAR_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_IMAGE_HOST)
                .long(ARG_IMAGE_HOST)
                .help("Image host used to delete replaced avatars")
                .env("SESAME_IMAGE_HOST")
                .default_value("none")
                .value_parser(["none", "cloudinary"]),
        )
        .arg(
            Arg::new(ARG_CLOUDINARY_CLOUD_NAME)
                .long(ARG_CLOUDINARY_CLOUD_NAME)
                .help("Cloudinary cloud name")
                .env("SESAME_CLOUDINARY_CLOUD_NAME"),
        )
        .arg(
            Arg::new(ARG_CLOUDINARY_API_KEY)
                .long(ARG_CLOUDINARY_API_KEY)
                .help("Cloudinary API key")
                .env("SESAME_CLOUDINARY_API_KEY"),
        )
        .arg(
            Arg::new(ARG_CLOUDINARY_API_SECRET)
                .long(ARG_CLOUDINARY_API_SECRET)
                .help("Cloudinary API secret used to sign destroy calls")
                .env("SESAME_CLOUDINARY_API_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_CLOUDINARY_URL)
                .long(ARG_CLOUDINARY_URL)
                .help("Cloudinary API base URL")
                .env("SESAME_CLOUDINARY_URL")
                .default_value(DEFAULT_CLOUDINARY_URL),
        )
}

#[derive(Debug)]
pub enum ImageHostOptions {
    Disabled,
    Cloudinary {
        base_url: String,
        cloud_name: String,
        api_key: String,
        api_secret: SecretString,
    },
}

#[derive(Debug)]
pub struct Options {
    pub secret: Option<SecretString>,
    pub image_host: ImageHostOptions,
}

impl Options {
    /// # Errors
    /// Returns an error if `cloudinary` is selected without its credentials.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let secret = matches
            .get_one::<String>(ARG_AVATAR_SECRET)
            .filter(|secret| !secret.is_empty())
            .map(|secret| SecretString::from(secret.clone()));

        let image_host = match matches
            .get_one::<String>(ARG_IMAGE_HOST)
            .map_or("none", String::as_str)
        {
            "none" => ImageHostOptions::Disabled,
            "cloudinary" => ImageHostOptions::Cloudinary {
                base_url: matches
                    .get_one::<String>(ARG_CLOUDINARY_URL)
                    .map_or_else(|| DEFAULT_CLOUDINARY_URL.to_string(), Clone::clone),
                cloud_name: cloudinary_arg(matches, ARG_CLOUDINARY_CLOUD_NAME)?,
                api_key: cloudinary_arg(matches, ARG_CLOUDINARY_API_KEY)?,
                api_secret: SecretString::from(cloudinary_arg(
                    matches,
                    ARG_CLOUDINARY_API_SECRET,
                )?),
            },
            other => bail!("unsupported image host: {other}"),
        };

        Ok(Self { secret, image_host })
    }
}

fn cloudinary_arg(matches: &ArgMatches, arg: &str) -> Result<String> {
    matches
        .get_one::<String>(arg)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .with_context(|| {
            format!("missing required argument: --{arg} (required when --{ARG_IMAGE_HOST}=cloudinary)")
        })
}
