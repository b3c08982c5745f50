/// Persistence seam between the sync protocol and its backing store
///
/// The protocol layer and the REST wrappers only ever talk to this trait;
/// the rusqlite implementation lives in `crate::database`. Room and item
/// state is created and mutated exclusively through these calls.
use anyhow::Result;
use serde_json::{ Map, Value };

use crate::models::{ EditorPoint, Room, RoomItem };

/// Error type for lookups that came up empty
///
/// Kept as a dedicated type so HTTP handlers can map it to a 404 while the
/// sync protocol folds it into its uniform failure response.
#[derive(Debug, thiserror::Error)]
#[error("{0} not found")]
pub struct NotFound(pub &'static str);

/// Abstract persistence operations consumed by the protocol layer
///
/// Implementations are not required to serialize concurrent updates to the
/// same room arriving from different connections; the hub orders delivery,
/// not persistence.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Create an empty room with the given id and name
    async fn create_room(&self, id: &str, name: &str) -> Result<Room>;

    /// Fetch a room with its items, `NotFound` if absent
    async fn get_room(&self, id: &str) -> Result<Room>;

    /// Append an item to a room's list
    async fn add_item(&self, room_id: &str, item: RoomItem) -> Result<()>;

    /// Delete an item from a room's list
    async fn remove_item(&self, room_id: &str, item_id: &str) -> Result<()>;

    /// Locate an item and apply a sparse field-update map to it
    ///
    /// Returns the updated item. Implementations persist whatever the
    /// update engine produced, so a failing key leaves the stored record
    /// untouched while earlier entries of a batch stay committed.
    async fn update_item_fields(
        &self,
        room_id: &str,
        item_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<RoomItem>;

    /// Replace a room's layout polygon
    async fn update_vertices(&self, room_id: &str, vertices: &[EditorPoint]) -> Result<()>;

    /// Rename a room
    async fn update_name(&self, room_id: &str, name: &str) -> Result<()>;

    /// Remove all items from a room
    async fn clear_items(&self, room_id: &str) -> Result<()>;

    /// Record which room this one was last cloned from
    async fn set_template_id(&self, room_id: &str, template_id: &str) -> Result<()>;

    /// Replace the contents of `id` with a copy of `target`
    ///
    /// Clears the room's items, copies the target's vertices and re-adds
    /// the target's items under fresh ids. Item ids are never carried over
    /// from the target.
    async fn clone_room(&self, id: &str, target: &str) -> Result<Room> {
        let source = self.get_room(target).await?;

        self.clear_items(id).await?;
        self.update_vertices(id, &source.vertices).await?;
        for mut item in source.items {
            item.id = uuid::Uuid::new_v4().to_string();
            self.add_item(id, item).await?;
        }
        self.set_template_id(id, target).await?;

        self.get_room(id).await
    }
}
