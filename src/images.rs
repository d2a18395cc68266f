//! Remote image deletion.
//!
//! Deleting a replaced avatar is best effort: callers log failures and move on,
//! so an orphaned image on the host is an accepted outcome.
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{Instrument, debug, info_span, warn};

pub const DEFAULT_CLOUDINARY_URL: &str = "https://api.cloudinary.com";

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Delete the image identified by `public_id`.
    async fn delete(&self, public_id: &str) -> Result<()>;
}

/// Used when no image host credentials are configured.
#[derive(Clone, Debug)]
pub struct DisabledImageHost;

#[async_trait]
impl ImageHost for DisabledImageHost {
    async fn delete(&self, public_id: &str) -> Result<()> {
        warn!(public_id, "image host not configured, skipping delete");
        Err(anyhow!("image host is not configured"))
    }
}

/// Cloudinary upload API client using signed `destroy` calls.
pub struct CloudinaryHost {
    http: Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
}

impl std::fmt::Debug for CloudinaryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryHost")
            .field("base_url", &self.base_url)
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .finish_non_exhaustive()
    }
}

impl CloudinaryHost {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        cloud_name: String,
        api_key: String,
        api_secret: SecretString,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build image host HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cloud_name,
            api_key,
            api_secret,
        })
    }

    fn destroy_url(&self) -> String {
        format!("{}/v1_1/{}/image/destroy", self.base_url, self.cloud_name)
    }
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn delete(&self, public_id: &str) -> Result<()> {
        let timestamp = OffsetDateTime::now_utc().unix_timestamp().to_string();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", timestamp.as_str())],
            self.api_secret.expose_secret(),
        );

        let url = self.destroy_url();
        let span = info_span!("image.destroy", http.method = "POST", url = %url, public_id);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.api_key.as_str()),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .instrument(span)
            .await
            .context("Image host request failed")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow!("image host returned {status}: {body}"));
        }

        // "not found" means the image is already gone, which is what we wanted.
        let result = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|json| json.get("result").and_then(Value::as_str).map(str::to_string));
        match result.as_deref() {
            Some("ok" | "not found") => {
                debug!(public_id, "image deleted");
                Ok(())
            }
            _ => Err(anyhow!("image host refused delete: {body}")),
        }
    }
}

/// Cloudinary request signature: parameters sorted by name, joined as
/// `k=v&k=v`, the API secret appended, then hashed (SHA-256, hex).
#[must_use]
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn host(url: &str) -> CloudinaryHost {
        CloudinaryHost::new(
            url,
            "demo".to_string(),
            "key-123".to_string(),
            SecretString::from("shh"),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn signature_sorts_parameters() {
        let forward = sign_params(&[("public_id", "a/b"), ("timestamp", "1700000000")], "s");
        let reversed = sign_params(&[("timestamp", "1700000000"), ("public_id", "a/b")], "s");
        assert_eq!(forward, reversed);
        assert_eq!(forward.len(), 64);

        let mut hasher = Sha256::new();
        hasher.update(b"public_id=a/b&timestamp=1700000000s");
        assert_eq!(forward, hex::encode(hasher.finalize()));
    }

    #[test]
    fn signature_depends_on_secret() {
        let params = [("public_id", "x"), ("timestamp", "1")];
        assert_ne!(sign_params(&params, "one"), sign_params(&params, "two"));
    }

    #[tokio::test]
    async fn disabled_host_reports_error() {
        assert!(DisabledImageHost.delete("avatars/old").await.is_err());
    }

    #[tokio::test]
    async fn destroy_posts_signed_form() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/destroy"))
            .and(body_string_contains("public_id=avatars%2Fold"))
            .and(body_string_contains("api_key=key-123"))
            .and(body_string_contains("signature_algorithm=sha256"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"result":"ok"}"#))
            .expect(1)
            .mount(&server)
            .await;

        host(&server.uri()).delete("avatars/old").await?;
        Ok(())
    }

    #[tokio::test]
    async fn already_missing_image_is_fine() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"result":"not found"}"#))
            .mount(&server)
            .await;

        host(&server.uri()).delete("avatars/gone").await?;
        Ok(())
    }

    #[tokio::test]
    async fn host_errors_are_reported() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid Signature"))
            .mount(&server)
            .await;

        let err = host(&server.uri()).delete("avatars/old").await.unwrap_err();
        assert!(err.to_string().contains("Invalid Signature"));
        Ok(())
    }
}
