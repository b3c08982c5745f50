/// API request type definitions
///
/// Standard request structures for REST API endpoints
use serde::Deserialize;

use crate::models::RoomItem;

/// Body for POST /api/room/create
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub name: String,
}

/// Query parameters for GET /api/room/get
#[derive(Debug, Clone, Deserialize)]
pub struct GetRoomQuery {
    pub id: String,
}

/// Query parameters for GET /api/room/clone
#[derive(Debug, Clone, Deserialize)]
pub struct CloneRoomQuery {
    /// Room whose contents get replaced
    pub id: String,
    /// Room to copy from
    #[serde(rename = "targetId", alias = "target_id")]
    pub target_id: String,
}

/// Body for POST /api/room/add
#[derive(Debug, Clone, Deserialize)]
pub struct AddItemRequest {
    /// Room to add the item to
    pub room: String,
    /// Item fields; the id is always generated server-side
    #[serde(flatten)]
    pub item: RoomItem,
}
