use crate::avatar::AvatarError;
use crate::platform::UpstreamError;
use crate::reset::ResetError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;

/// Body of every failed response.
#[derive(ToSchema, Serialize, Debug)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{message}: {detail}")]
    Upstream { message: String, detail: String },
    #[error("server misconfigured")]
    Misconfigured,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn upstream(message: &str, detail: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.to_string(),
            detail: detail.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Upstream { .. } | Self::Misconfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, detail) = match self {
            Self::Upstream { message, detail } => {
                error!("{message}: {detail}");
                (message, Some(detail))
            }
            Self::Misconfigured => {
                error!("request rejected: server misconfigured");
                ("server misconfigured".to_string(), None)
            }
            Self::BadRequest(message) | Self::NotFound(message) | Self::Forbidden(message) => {
                warn!(status = status.as_u16(), "{message}");
                (message, None)
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error,
                detail,
            }),
        )
            .into_response()
    }
}

impl From<ResetError> for ApiError {
    fn from(err: ResetError) -> Self {
        match err {
            ResetError::InvalidCode => Self::bad_request("invalid or expired code"),
            ResetError::UserNotFound => Self::NotFound("user not found".to_string()),
            ResetError::Store(source) => Self::upstream("failed to store reset code", source.detail()),
            ResetError::Dispatch(detail) => Self::upstream("failed to send email", detail),
            ResetError::Verify(source) => Self::upstream("failed to verify code", source.detail()),
            ResetError::Lookup(source) => Self::upstream("failed to look up user", source.detail()),
            ResetError::Update(source) => {
                Self::upstream("failed to update password", source.detail())
            }
        }
    }
}

impl From<AvatarError> for ApiError {
    fn from(err: AvatarError) -> Self {
        match err {
            AvatarError::Misconfigured => Self::Misconfigured,
            AvatarError::Forbidden => Self::Forbidden("forbidden".to_string()),
            AvatarError::Fetch(source) => Self::upstream("failed to read profile", source.detail()),
            AvatarError::Update(source) => {
                Self::upstream("failed to update profile", source.detail())
            }
        }
    }
}

/// Room presence calls have no domain error of their own.
impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        Self::upstream("room presence request failed", err.detail())
    }
}
