//! Avatar replacement guarded by a shared secret.
use crate::images::ImageHost;
use crate::platform::{ProfileRecord, ProfileStore, UpstreamError};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Header carrying the shared avatar secret.
pub const SECRET_HEADER: &str = "x-avatar-secret";

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("avatar secret is not configured")]
    Misconfigured,
    #[error("invalid avatar secret")]
    Forbidden,
    #[error("failed to read profile")]
    Fetch(#[source] UpstreamError),
    #[error("failed to update profile")]
    Update(#[source] UpstreamError),
}

pub struct AvatarFlow {
    profiles: ProfileStore,
    images: Arc<dyn ImageHost>,
    secret: Option<SecretString>,
}

impl AvatarFlow {
    #[must_use]
    pub fn new(
        profiles: ProfileStore,
        images: Arc<dyn ImageHost>,
        secret: Option<SecretString>,
    ) -> Self {
        Self {
            profiles,
            images,
            secret,
        }
    }

    /// Check the presented secret against the configured one.
    ///
    /// # Errors
    /// [`AvatarError::Misconfigured`] when no secret is configured,
    /// [`AvatarError::Forbidden`] when the presented value is missing or wrong.
    pub fn authorize(&self, presented: Option<&str>) -> Result<(), AvatarError> {
        let expected = self
            .secret
            .as_ref()
            .map(ExposeSecret::expose_secret)
            .filter(|secret| !secret.is_empty())
            .ok_or(AvatarError::Misconfigured)?;

        match presented {
            Some(value) if constant_time_eq(expected, value) => Ok(()),
            _ => Err(AvatarError::Forbidden),
        }
    }

    /// Point the profile at a new image and drop the old one from the host.
    ///
    /// The old image is deleted before the profile write, and only when it
    /// differs from the new one. A failed delete is logged and ignored; the
    /// write happens regardless.
    ///
    /// # Errors
    /// Returns an error if the profile cannot be read or written.
    #[instrument(skip(self, new_url))]
    pub async fn update(
        &self,
        user_id: &str,
        new_public_id: &str,
        new_url: &str,
    ) -> Result<Vec<ProfileRecord>, AvatarError> {
        let old_public_id = self
            .profiles
            .fetch(user_id)
            .await
            .map_err(AvatarError::Fetch)?
            .and_then(|profile| profile.avatar_public_id)
            .filter(|id| !id.is_empty());

        match old_public_id {
            Some(old) if old != new_public_id => {
                if let Err(err) = self.images.delete(&old).await {
                    warn!(old_public_id = %old, "failed to delete previous avatar: {err:#}");
                } else {
                    debug!(old_public_id = %old, "previous avatar deleted");
                }
            }
            _ => debug!("no previous avatar to delete"),
        }

        let updated = self
            .profiles
            .update_avatar(user_id, new_url, new_public_id)
            .await
            .map_err(AvatarError::Update)?;

        info!(rows = updated.len(), "avatar updated");
        Ok(updated)
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}
