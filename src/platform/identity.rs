//! Auth admin API: account lookup by email and password overwrite.

use super::{PlatformClient, UpstreamError, normalize};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, instrument};

const ADMIN_USERS: &[&str] = &["auth", "v1", "admin", "users"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub email: Option<String>,
}

impl UserRecord {
    fn from_value(value: &Value) -> Option<Self> {
        let id = value.get("id").and_then(normalize::scalar_id)?;
        let email = value
            .get("email")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self { id, email })
    }
}

#[derive(Debug, Clone)]
pub struct IdentityAdmin {
    client: PlatformClient,
}

impl IdentityAdmin {
    #[must_use]
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }

    /// Resolve the account registered under `email`.
    ///
    /// The filtered listing may contain partial matches, so only records whose
    /// email equals `email` (ignoring ASCII case) are considered; the first of
    /// those in returned order wins. `Ok(None)` means no usable match.
    ///
    /// # Errors
    /// Returns [`UpstreamError`] on transport failure, non-2xx, or a body that is not JSON.
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, UpstreamError> {
        let builder = self
            .client
            .request(Method::GET, ADMIN_USERS)
            .query(&[("filter", email)]);
        let response = self.client.send("identity.lookup", builder).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|err| UpstreamError::Decode {
                operation: "identity.lookup",
                detail: err.to_string(),
            })?;

        let records = normalize::record_list(body);
        debug!(candidates = records.len(), "identity lookup answered");

        Ok(records
            .iter()
            .filter_map(UserRecord::from_value)
            .find(|user| {
                user.email
                    .as_deref()
                    .is_some_and(|candidate| candidate.eq_ignore_ascii_case(email))
            }))
    }

    /// Overwrite the password of `user_id`.
    ///
    /// # Errors
    /// Returns [`UpstreamError`] on transport failure or any non-2xx answer.
    #[instrument(skip(self, password))]
    pub async fn set_password(
        &self,
        user_id: &str,
        password: &SecretString,
    ) -> Result<(), UpstreamError> {
        let mut segments = ADMIN_USERS.to_vec();
        segments.push(user_id);
        let builder = self
            .client
            .request(Method::PUT, &segments)
            .json(&json!({ "password": password.expose_secret() }));
        self.client.send("identity.set_password", builder).await?;
        debug!("password updated");
        Ok(())
    }
}
