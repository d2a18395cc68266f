//! HTTP clients for the hosted data platform.
//!
//! Every call made here is a single round trip authenticated with the
//! server-held service key (`apikey` header plus bearer token). Responses other
//! than 2xx become [`UpstreamError::Status`] carrying the raw body, which is
//! never interpreted further. Nothing is retried.

pub mod codes;
pub mod identity;
pub mod normalize;
pub mod profiles;
pub mod rooms;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use thiserror::Error;
use tracing::{Instrument, debug, info_span};
use url::Url;

pub use self::codes::{ResetCodeStore, ResetRequest};
pub use self::identity::{IdentityAdmin, UserRecord};
pub use self::profiles::{ProfileRecord, ProfileStore};
pub use self::rooms::{RoomPresence, RoomSummary};

const REST_ROOT_PATH: &[&str] = &["rest", "v1", ""];

/// Failure of a single collaborator call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation} returned {status}: {body}")]
    Status {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("{operation} returned an unexpected body: {detail}")]
    Decode {
        operation: &'static str,
        detail: String,
    },
}

impl UpstreamError {
    /// Diagnostic text handed back to API callers.
    ///
    /// For non-2xx responses this is the collaborator's raw body.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Status { body, .. } if !body.is_empty() => body.clone(),
            _ => self.to_string(),
        }
    }
}

/// Shared transport for the platform's REST, RPC and auth admin endpoints.
#[derive(Clone)]
pub struct PlatformClient {
    http: Client,
    base_url: Url,
    service_key: SecretString,
}

impl std::fmt::Debug for PlatformClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformClient")
            .field("base_url", &self.base_url.as_str())
            .field("service_key", &"***")
            .finish_non_exhaustive()
    }
}

impl PlatformClient {
    /// Build a client for `base_url` with a bounded per-call timeout.
    ///
    /// # Errors
    /// Returns an error if the URL is not an absolute http(s) URL or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, service_key: SecretString, timeout: Duration) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid store URL: {base_url}"))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(anyhow!("Store URL must be an http(s) URL: {base_url}"));
        }
        if service_key.expose_secret().trim().is_empty() {
            return Err(anyhow!("Store service key must not be empty"));
        }

        let http = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build platform HTTP client")?;

        Ok(Self {
            http,
            base_url,
            service_key,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve path segments against the base URL, percent-encoding each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Start an authenticated request.
    pub(crate) fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let key = self.service_key.expose_secret();
        self.http
            .request(method, self.endpoint(segments))
            .header("apikey", key)
            .bearer_auth(key)
    }

    /// Send a request and turn transport errors and non-2xx answers into
    /// [`UpstreamError`].
    pub(crate) async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, UpstreamError> {
        let span = info_span!("platform.request", operation);
        let response = request
            .send()
            .instrument(span)
            .await
            .map_err(|source| UpstreamError::Transport { operation, source })?;

        let status = response.status();
        if status.is_success() {
            debug!(operation, %status, "platform call succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(UpstreamError::Status {
            operation,
            status,
            body,
        })
    }

    /// Read a response body as text, mapping read failures to [`UpstreamError::Decode`].
    pub(crate) async fn text(
        operation: &'static str,
        response: Response,
    ) -> Result<String, UpstreamError> {
        response.text().await.map_err(|err| UpstreamError::Decode {
            operation,
            detail: err.to_string(),
        })
    }

    /// Reachability probe used by `/health`.
    ///
    /// # Errors
    /// Returns an error if the REST root cannot be reached or answers non-2xx.
    pub async fn ping(&self) -> Result<(), UpstreamError> {
        let request = self.request(Method::GET, REST_ROOT_PATH);
        self.send("store.ping", request).await.map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn client(url: &str) -> PlatformClient {
        PlatformClient::new(
            url,
            SecretString::from("service-key"),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn rejects_non_http_base_url() {
        let result = PlatformClient::new(
            "ftp://store.example.com",
            SecretString::from("key"),
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_service_key() {
        let result = PlatformClient::new(
            "https://store.example.com",
            SecretString::from("  "),
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn endpoint_appends_and_encodes_segments() {
        let client = client("https://store.example.com/");
        let url = client.endpoint(&["auth", "v1", "admin", "users", "a b/c"]);
        assert_eq!(
            url.as_str(),
            "https://store.example.com/auth/v1/admin/users/a%20b%2Fc"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let client = client("https://proxy.example.com/platform");
        let url = client.endpoint(&["rest", "v1", "rpc", "verify_reset_code"]);
        assert_eq!(
            url.as_str(),
            "https://proxy.example.com/platform/rest/v1/rpc/verify_reset_code"
        );
    }

    #[test]
    fn status_error_detail_is_raw_body() {
        let err = UpstreamError::Status {
            operation: "codes.insert",
            status: StatusCode::CONFLICT,
            body: r#"{"message":"duplicate key"}"#.to_string(),
        };
        assert_eq!(err.detail(), r#"{"message":"duplicate key"}"#);
    }

    #[tokio::test]
    async fn ping_sends_service_key() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server.uri()).ping().await?;
        Ok(())
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = client(&server.uri()).ping().await.unwrap_err();
        assert!(matches!(
            err,
            UpstreamError::Status {
                status: StatusCode::UNAUTHORIZED,
                ..
            }
        ));
        assert_eq!(err.detail(), "invalid api key");
        Ok(())
    }
}
