//! Password reset endpoints.

use super::{
    ResetPasswordRequest, SendCodeRequest, SuccessResponse, VerifyCodeRequest, normalize_email,
    payload, required,
};
use crate::api::error::{ApiError, ErrorBody};
use crate::reset::ResetFlow;
use axum::{Json, extract::Extension};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyCodeResponse {
    pub success: bool,
    pub valid: bool,
}

/// Generate a one-time code, store it and email it.
#[utoipa::path(
    post,
    path = "/send-code",
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "Code stored and sent", body = SuccessResponse),
        (status = 400, description = "Missing email", body = ErrorBody),
        (status = 500, description = "Store or email failure", body = ErrorBody)
    ),
    tag = "reset"
)]
pub async fn send_code(
    flow: Extension<Arc<ResetFlow>>,
    request: Option<Json<SendCodeRequest>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let request = payload(request)?;
    let email = normalize_email(&required(request.email.as_deref(), "email")?);

    flow.send_code(&email).await?;
    Ok(SuccessResponse::ok())
}

/// Check a code without consuming anything locally.
#[utoipa::path(
    post,
    path = "/verify-code",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Verification result", body = VerifyCodeResponse),
        (status = 400, description = "Missing fields", body = ErrorBody),
        (status = 500, description = "Verification procedure failed", body = ErrorBody)
    ),
    tag = "reset"
)]
pub async fn verify_code(
    flow: Extension<Arc<ResetFlow>>,
    request: Option<Json<VerifyCodeRequest>>,
) -> Result<Json<VerifyCodeResponse>, ApiError> {
    let request = payload(request)?;
    let email = normalize_email(&required(request.email.as_deref(), "email")?);
    let code = required(request.code.as_deref(), "code")?;

    let valid = flow.verify_code(&email, &code).await?;
    Ok(Json(VerifyCodeResponse {
        success: true,
        valid,
    }))
}

/// Verify the code again and overwrite the account password.
#[utoipa::path(
    post,
    path = "/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = SuccessResponse),
        (status = 400, description = "Missing fields or invalid code", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 500, description = "Upstream failure", body = ErrorBody)
    ),
    tag = "reset"
)]
pub async fn reset_password(
    flow: Extension<Arc<ResetFlow>>,
    request: Option<Json<ResetPasswordRequest>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let request = payload(request)?;
    let email = normalize_email(&required(request.email.as_deref(), "email")?);
    let code = required(request.code.as_deref(), "code")?;
    // Checked for blankness, but passed on exactly as typed.
    required(request.new_password.as_deref(), "new_password")?;
    let new_password = SecretString::from(request.new_password.unwrap_or_default());

    flow.reset_password(&email, &code, &new_password).await?;
    Ok(SuccessResponse::ok())
}
