//! Room presence: online flags on `room_members`, never deleted.

use super::{PlatformClient, UpstreamError, normalize};
use reqwest::Method;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{debug, instrument};
use utoipa::ToSchema;

const UPSERT_RPC: &[&str] = &["rest", "v1", "rpc", "upsert_room_member"];
const MEMBERS_TABLE: &[&str] = &["rest", "v1", "room_members"];

#[derive(ToSchema, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSummary {
    pub room_id: String,
    pub member_count: u64,
}

#[derive(Debug, Clone)]
pub struct RoomPresence {
    client: PlatformClient,
}

impl RoomPresence {
    #[must_use]
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }

    /// Mark `user_id` online in `room_id`.
    ///
    /// # Errors
    /// Returns [`UpstreamError`] if the upsert procedure fails.
    pub async fn join(&self, room_id: &str, user_id: &str) -> Result<(), UpstreamError> {
        self.set_online(room_id, user_id, true).await
    }

    /// Mark `user_id` offline in `room_id`.
    ///
    /// # Errors
    /// Returns [`UpstreamError`] if the upsert procedure fails.
    pub async fn leave(&self, room_id: &str, user_id: &str) -> Result<(), UpstreamError> {
        self.set_online(room_id, user_id, false).await
    }

    #[instrument(skip(self))]
    async fn set_online(
        &self,
        room_id: &str,
        user_id: &str,
        is_online: bool,
    ) -> Result<(), UpstreamError> {
        let builder = self.client.request(Method::POST, UPSERT_RPC).json(&json!({
            "p_room_id": room_id,
            "p_user_id": user_id,
            "p_is_online": is_online,
        }));
        self.client.send("rooms.upsert", builder).await?;
        Ok(())
    }

    /// Online member counts per room, largest first.
    ///
    /// # Errors
    /// Returns [`UpstreamError`] on transport failure, non-2xx, or a body that is not JSON.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<RoomSummary>, UpstreamError> {
        let builder = self
            .client
            .request(Method::GET, MEMBERS_TABLE)
            .query(&[("select", "room_id"), ("is_online", "eq.true")]);
        let response = self.client.send("rooms.list", builder).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|err| UpstreamError::Decode {
                operation: "rooms.list",
                detail: err.to_string(),
            })?;

        let rooms = count_members(&normalize::record_list(body));
        debug!(rooms = rooms.len(), "room presence listed");
        Ok(rooms)
    }
}

/// Count rows per `room_id`, then order by count descending. Rooms with equal
/// counts keep the order in which they first appeared.
fn count_members(rows: &[Value]) -> Vec<RoomSummary> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut rooms: Vec<RoomSummary> = Vec::new();

    for room_id in rows
        .iter()
        .filter_map(|row| row.get("room_id").and_then(normalize::scalar_id))
    {
        if let Some(&index) = positions.get(&room_id) {
            rooms[index].member_count += 1;
        } else {
            positions.insert(room_id.clone(), rooms.len());
            rooms.push(RoomSummary {
                room_id,
                member_count: 1,
            });
        }
    }

    rooms.sort_by(|a, b| b.member_count.cmp(&a.member_count));
    rooms
}
