//! Route handlers and the request/response shapes they exchange.
//!
//! Request fields are all optional at the serde level so that a missing or
//! empty field is reported as a 400 with a field-specific message, before any
//! collaborator is contacted.

pub mod avatar;
pub mod health;
pub mod reset;
pub mod rooms;
pub mod root;

use super::error::ApiError;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct SendCodeRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct VerifyCodeRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(ToSchema, Deserialize, Default)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct AvatarUpdateRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub new_public_id: Option<String>,
    #[serde(default)]
    pub new_url: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct RoomMembershipRequest {
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub(crate) fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// Unwrap an optional JSON body, rejecting absent or malformed payloads.
pub(crate) fn payload<T>(payload: Option<Json<T>>) -> Result<T, ApiError> {
    payload
        .map(|Json(payload)| payload)
        .ok_or_else(|| ApiError::bad_request("Missing payload"))
}

/// Trimmed value of a required field.
pub(crate) fn required(value: Option<&str>, field: &str) -> Result<String, ApiError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ApiError::bad_request(format!("{field} is required"))),
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_values() {
        assert!(matches!(
            required(Some("  x  "), "email").as_deref(),
            Ok("x")
        ));
    }

    #[test]
    fn required_rejects_missing_and_blank() {
        assert!(matches!(
            required(None, "email"),
            Err(ApiError::BadRequest(message)) if message == "email is required"
        ));
        assert!(required(Some("   "), "code").is_err());
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn missing_payload_is_bad_request() {
        let result = payload::<SendCodeRequest>(None);
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
