use super::{AvatarUpdateRequest, payload, required};
use crate::api::error::{ApiError, ErrorBody};
use crate::avatar::{AvatarFlow, SECRET_HEADER};
use crate::platform::ProfileRecord;
use axum::{Json, extract::Extension, http::HeaderMap};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Debug)]
pub struct AvatarUpdateResponse {
    pub success: bool,
    pub updated: Vec<ProfileRecord>,
}

#[utoipa::path(
    post,
    path = "/avatar/update",
    request_body = AvatarUpdateRequest,
    params(
        ("x-avatar-secret" = String, Header, description = "Shared avatar secret")
    ),
    responses(
        (status = 200, description = "Profile updated", body = AvatarUpdateResponse),
        (status = 400, description = "Missing fields", body = ErrorBody),
        (status = 403, description = "Bad secret", body = ErrorBody),
        (status = 500, description = "Profile store failure or missing secret configuration", body = ErrorBody)
    ),
    tag = "avatar"
)]
pub async fn update_avatar(
    headers: HeaderMap,
    flow: Extension<Arc<AvatarFlow>>,
    request: Option<Json<AvatarUpdateRequest>>,
) -> Result<Json<AvatarUpdateResponse>, ApiError> {
    let presented = headers
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    flow.authorize(presented)?;

    let request = payload(request)?;
    let user_id = required(request.user_id.as_deref(), "user_id")?;
    let new_public_id = required(request.new_public_id.as_deref(), "new_public_id")?;
    let new_url = required(request.new_url.as_deref(), "new_url")?;

    let updated = flow.update(&user_id, &new_public_id, &new_url).await?;
    Ok(Json(AvatarUpdateResponse {
        success: true,
        updated,
    }))
}
