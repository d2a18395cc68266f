use super::{PlatformClient, UpstreamError, normalize};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument};
use utoipa::ToSchema;

const PROFILES_TABLE: &[&str] = &["rest", "v1", "profiles"];
const PROFILE_COLUMNS: &str = "id,avatar_url,avatar_public_id";

#[derive(ToSchema, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub avatar_public_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    client: PlatformClient,
}

impl ProfileStore {
    #[must_use]
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }

    /// Read the profile row for `user_id`, if any.
    ///
    /// # Errors
    /// Returns [`UpstreamError`] on transport failure, non-2xx, or an unreadable body.
    #[instrument(skip(self))]
    pub async fn fetch(&self, user_id: &str) -> Result<Option<ProfileRecord>, UpstreamError> {
        let builder = self
            .client
            .request(Method::GET, PROFILES_TABLE)
            .query(&[
                ("id", format!("eq.{user_id}").as_str()),
                ("select", PROFILE_COLUMNS),
            ]);
        let response = self.client.send("profiles.fetch", builder).await?;
        let rows = decode_rows("profiles.fetch", response).await?;
        Ok(rows.into_iter().next())
    }

    /// Write new avatar fields and return the updated rows as the platform
    /// represents them.
    ///
    /// # Errors
    /// Returns [`UpstreamError`] on transport failure, non-2xx, or an unreadable body.
    #[instrument(skip(self))]
    pub async fn update_avatar(
        &self,
        user_id: &str,
        avatar_url: &str,
        avatar_public_id: &str,
    ) -> Result<Vec<ProfileRecord>, UpstreamError> {
        let builder = self
            .client
            .request(Method::PATCH, PROFILES_TABLE)
            .query(&[
                ("id", format!("eq.{user_id}").as_str()),
                ("select", PROFILE_COLUMNS),
            ])
            .header("Prefer", "return=representation")
            .json(&json!({
                "avatar_url": avatar_url,
                "avatar_public_id": avatar_public_id,
            }));
        let response = self.client.send("profiles.update", builder).await?;
        let rows = decode_rows("profiles.update", response).await?;
        debug!(rows = rows.len(), "profile avatar updated");
        Ok(rows)
    }
}

async fn decode_rows(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<Vec<ProfileRecord>, UpstreamError> {
    let body = PlatformClient::text(operation, response).await?;
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(&body).map_err(|err| UpstreamError::Decode {
        operation,
        detail: err.to_string(),
    })?;
    normalize::record_list(value)
        .into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|err| UpstreamError::Decode {
                operation,
                detail: err.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use std::net::TcpListener;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn profiles(url: &str) -> ProfileStore {
        let client = PlatformClient::new(
            url,
            SecretString::from("service-key"),
            Duration::from_secs(5),
        )
        .unwrap();
        ProfileStore::new(client)
    }

    #[tokio::test]
    async fn fetch_returns_first_row() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("id", "eq.user-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "user-1",
                "avatar_url": "https://cdn.example.com/old.png",
                "avatar_public_id": "avatars/old"
            }])))
            .mount(&server)
            .await;

        let profile = profiles(&server.uri()).fetch("user-1").await?.unwrap();
        assert_eq!(profile.avatar_public_id.as_deref(), Some("avatars/old"));
        Ok(())
    }

    #[tokio::test]
    async fn fetch_missing_profile_is_none() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        assert!(profiles(&server.uri()).fetch("nobody").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn update_patches_and_returns_representation() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("id", "eq.user-1"))
            .and(header("Prefer", "return=representation"))
            .and(body_json(json!({
                "avatar_url": "https://cdn.example.com/new.png",
                "avatar_public_id": "avatars/new"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "user-1",
                "avatar_url": "https://cdn.example.com/new.png",
                "avatar_public_id": "avatars/new"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let rows = profiles(&server.uri())
            .update_avatar("user-1", "https://cdn.example.com/new.png", "avatars/new")
            .await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].avatar_public_id.as_deref(), Some("avatars/new"));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_rows_are_decode_errors() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = profiles(&server.uri()).fetch("user-1").await;
        assert!(matches!(result, Err(UpstreamError::Decode { .. })));
        Ok(())
    }
}
