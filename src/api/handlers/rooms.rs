//! Room presence endpoints.

use super::{RoomMembershipRequest, SuccessResponse, payload, required};
use crate::api::error::{ApiError, ErrorBody};
use crate::platform::{RoomPresence, RoomSummary};
use axum::{Json, extract::Extension};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Debug)]
pub struct RoomsResponse {
    pub success: bool,
    pub rooms: Vec<RoomSummary>,
}

fn membership(request: Option<Json<RoomMembershipRequest>>) -> Result<(String, String), ApiError> {
    let request = payload(request)?;
    Ok((
        required(request.room_id.as_deref(), "room_id")?,
        required(request.user_id.as_deref(), "user_id")?,
    ))
}

#[utoipa::path(
    post,
    path = "/rooms/join",
    request_body = RoomMembershipRequest,
    responses(
        (status = 200, description = "Member marked online", body = SuccessResponse),
        (status = 400, description = "Missing fields", body = ErrorBody),
        (status = 500, description = "Upsert failed", body = ErrorBody)
    ),
    tag = "rooms"
)]
pub async fn join(
    rooms: Extension<RoomPresence>,
    request: Option<Json<RoomMembershipRequest>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (room_id, user_id) = membership(request)?;
    rooms.join(&room_id, &user_id).await?;
    Ok(SuccessResponse::ok())
}

#[utoipa::path(
    post,
    path = "/rooms/leave",
    request_body = RoomMembershipRequest,
    responses(
        (status = 200, description = "Member marked offline", body = SuccessResponse),
        (status = 400, description = "Missing fields", body = ErrorBody),
        (status = 500, description = "Upsert failed", body = ErrorBody)
    ),
    tag = "rooms"
)]
pub async fn leave(
    rooms: Extension<RoomPresence>,
    request: Option<Json<RoomMembershipRequest>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (room_id, user_id) = membership(request)?;
    rooms.leave(&room_id, &user_id).await?;
    Ok(SuccessResponse::ok())
}

/// Online member counts per room, largest first.
#[utoipa::path(
    get,
    path = "/rooms",
    responses(
        (status = 200, description = "Rooms with online members", body = RoomsResponse),
        (status = 500, description = "Listing failed", body = ErrorBody)
    ),
    tag = "rooms"
)]
pub async fn list(rooms: Extension<RoomPresence>) -> Result<Json<RoomsResponse>, ApiError> {
    let rooms = rooms.list().await?;
    Ok(Json(RoomsResponse {
        success: true,
        rooms,
    }))
}
