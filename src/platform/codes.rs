//! Reset-code persistence and the remote verification procedure.
//!
//! Rows live in `password_reset_codes`; `verify_reset_code(p_email, p_code)` is
//! the only authority on whether a code is valid, expired or already used.

use super::{PlatformClient, UpstreamError, normalize};
use reqwest::Method;
use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;
use tracing::{debug, instrument};

const CODES_TABLE: &[&str] = &["rest", "v1", "password_reset_codes"];
const VERIFY_RPC: &[&str] = &["rest", "v1", "rpc", "verify_reset_code"];

/// A stored one-time code.
#[derive(Debug, Clone, Serialize)]
pub struct ResetRequest {
    pub email: String,
    pub code: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ResetRequest {
    #[must_use]
    pub fn new(email: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            code: code.into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResetCodeStore {
    client: PlatformClient,
}

impl ResetCodeStore {
    #[must_use]
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }

    /// Persist a freshly generated code.
    ///
    /// # Errors
    /// Returns [`UpstreamError`] on transport failure or any non-2xx answer.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn insert(&self, request: &ResetRequest) -> Result<(), UpstreamError> {
        let builder = self
            .client
            .request(Method::POST, CODES_TABLE)
            .header("Prefer", "return=minimal")
            .json(request);
        self.client.send("codes.insert", builder).await?;
        debug!("reset code stored");
        Ok(())
    }

    /// Ask the verification procedure whether `(email, code)` is currently valid.
    ///
    /// # Errors
    /// Returns [`UpstreamError`] on transport failure or any non-2xx answer. A
    /// negative verdict is `Ok(false)`, not an error.
    #[instrument(skip(self, code))]
    pub async fn verify(&self, email: &str, code: &str) -> Result<bool, UpstreamError> {
        let builder = self
            .client
            .request(Method::POST, VERIFY_RPC)
            .json(&json!({ "p_email": email, "p_code": code }));
        let response = self.client.send("codes.verify", builder).await?;
        let body = PlatformClient::text("codes.verify", response).await?;
        let valid = normalize::is_truthy(&body);
        debug!(valid, "reset code verification answered");
        Ok(valid)
    }
}
