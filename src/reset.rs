//! Password reset flow: send a code, verify it, then reset the password.
//!
//! The three steps are independent requests correlated only by the
//! `(email, code)` pair. Nothing is remembered between them: `reset_password`
//! always asks the verification procedure again, so a code that was accepted by
//! an earlier `verify_code` call still has to be valid at the moment of use.
use crate::email::{EmailMessage, Mailer};
use crate::platform::{IdentityAdmin, ResetCodeStore, ResetRequest, UpstreamError};
use rand::{Rng, rngs::OsRng};
use secrecy::SecretString;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

pub const CODE_MIN: u32 = 100_000;
pub const CODE_MAX: u32 = 999_999;

/// Six random digits from the OS random source.
#[must_use]
pub fn generate_code() -> String {
    OsRng.gen_range(CODE_MIN..=CODE_MAX).to_string()
}

#[derive(Debug, Error)]
pub enum ResetError {
    #[error("failed to store reset code")]
    Store(#[source] UpstreamError),
    #[error("failed to send reset code email: {0}")]
    Dispatch(String),
    #[error("failed to verify reset code")]
    Verify(#[source] UpstreamError),
    #[error("invalid or expired code")]
    InvalidCode,
    #[error("user not found")]
    UserNotFound,
    #[error("failed to look up user")]
    Lookup(#[source] UpstreamError),
    #[error("failed to update password")]
    Update(#[source] UpstreamError),
}

pub struct ResetFlow {
    codes: ResetCodeStore,
    identity: IdentityAdmin,
    mailer: Arc<dyn Mailer>,
}

impl ResetFlow {
    #[must_use]
    pub fn new(codes: ResetCodeStore, identity: IdentityAdmin, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            codes,
            identity,
            mailer,
        }
    }

    /// Generate, store and mail a new code.
    ///
    /// The code is stored before it is mailed, so a code that never reached the
    /// store is never sent. If mailing fails the stored code is left in place.
    ///
    /// # Errors
    /// [`ResetError::Store`] if persistence fails (no email is attempted),
    /// [`ResetError::Dispatch`] if the email could not be delivered.
    #[instrument(skip(self))]
    pub async fn send_code(&self, email: &str) -> Result<(), ResetError> {
        let request = ResetRequest::new(email, generate_code());
        self.codes
            .insert(&request)
            .await
            .map_err(ResetError::Store)?;

        let message = EmailMessage::reset_code(email, &request.code);
        if let Err(err) = self.mailer.send(&message).await {
            warn!("reset code stored but email delivery failed: {err:#}");
            return Err(ResetError::Dispatch(format!("{err:#}")));
        }

        info!("reset code sent");
        Ok(())
    }

    /// Ask the store whether `(email, code)` is currently valid.
    ///
    /// # Errors
    /// [`ResetError::Verify`] if the verification procedure could not be called.
    #[instrument(skip(self, code))]
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<bool, ResetError> {
        self.codes
            .verify(email, code)
            .await
            .map_err(ResetError::Verify)
    }

    /// Re-verify the code, resolve the account and overwrite its password.
    ///
    /// # Errors
    /// [`ResetError::InvalidCode`] if the store rejects the code,
    /// [`ResetError::UserNotFound`] if no account matches `email`, or an
    /// upstream variant if any collaborator call fails.
    #[instrument(skip(self, code, new_password))]
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &SecretString,
    ) -> Result<(), ResetError> {
        if !self.verify_code(email, code).await? {
            return Err(ResetError::InvalidCode);
        }

        let user = self
            .identity
            .find_by_email(email)
            .await
            .map_err(ResetError::Lookup)?
            .ok_or(ResetError::UserNotFound)?;

        self.identity
            .set_password(&user.id, new_password)
            .await
            .map_err(ResetError::Update)?;

        info!(user_id = %user.id, "password reset");
        Ok(())
    }
}
