/// Event decode and dispatch for the sync protocol
///
/// Turns one raw inbound frame into exactly one outbound response. Envelope
/// failures (missing room/event/data, undecodable JSON) never reach the
/// hub: they are handed straight back to the sending connection. Handler
/// failures travel through the hub as a sender-only actionFailed so they
/// stay ordered with the room's broadcasts.
///
/// The protocol holds no state across invocations beyond the storage calls
/// it issues.
use std::sync::Arc;

use anyhow::{ bail, Context };
use serde::{ Deserialize, Serialize };
use serde_json::{ Map, Value };

use crate::arguments::is_debug_sync_enabled;
use crate::logger::{ self, LogTag };
use crate::models::{ EditorPoint, RoomItem };
use crate::storage::Storage;
use crate::webserver::ws::hub::{ self, ConnectionId };
use crate::webserver::ws::message::{ MessageResponse, RoomMessage };

/// One entry of an updateItems batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemUpdate {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub updated: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct UpdateItemsPayload {
    #[serde(default)]
    items: Vec<ItemUpdate>,
}

#[derive(Debug, Deserialize)]
struct DeleteItemPayload {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct UpdateLayoutPayload {
    #[serde(default)]
    vertices: Vec<EditorPoint>,
}

#[derive(Debug, Deserialize)]
struct CloneRoomPayload {
    #[serde(default)]
    id: String,
    #[serde(default, rename = "targetId", alias = "target_id")]
    target_id: String,
}

#[derive(Debug, Deserialize)]
struct UpdateRoomNamePayload {
    #[serde(default)]
    name: String,
}

/// A validated command, one variant per supported event name
#[derive(Debug)]
enum Command {
    AddItem(RoomItem),
    UpdateItems(Vec<ItemUpdate>),
    DeleteItem(String),
    UpdateLayout(Vec<EditorPoint>),
    CloneRoom { id: String, target_id: String },
    UpdateRoomName(String),
}

impl Command {
    /// Resolve an event name and its raw payload into a typed command
    fn parse(event: &str, data: Value) -> anyhow::Result<Command> {
        match event {
            "addItem" => {
                let item: RoomItem = serde_json::from_value(data)
                    .context("Unable to translate addItem event")?;
                Ok(Command::AddItem(item))
            }
            "updateItems" => {
                let payload: UpdateItemsPayload =
                    serde_json::from_value(data).context("Failed to decode event data")?;
                Ok(Command::UpdateItems(payload.items))
            }
            "deleteItem" => {
                let payload: DeleteItemPayload =
                    serde_json::from_value(data).context("Failed to decode event data")?;
                Ok(Command::DeleteItem(payload.id))
            }
            "updateLayout" => {
                let payload: UpdateLayoutPayload = serde_json::from_value(data)
                    .context("Unable to translate updateLayout event")?;
                Ok(Command::UpdateLayout(payload.vertices))
            }
            "cloneRoom" => {
                let payload: CloneRoomPayload = serde_json::from_value(data)
                    .context("Unable to translate cloneRoom event")?;
                Ok(Command::CloneRoom { id: payload.id, target_id: payload.target_id })
            }
            "updateRoomName" => {
                let payload: UpdateRoomNamePayload = serde_json::from_value(data)
                    .context("Unable to translate updateRoomName event")?;
                Ok(Command::UpdateRoomName(payload.name))
            }
            other => bail!("Unknown event '{}'", other),
        }
    }
}

/// Result of translating one inbound frame
#[derive(Debug)]
pub enum Translation {
    /// Route through the hub (regular responses and handler failures)
    Broadcast(hub::Message),
    /// Hand straight back to the sending connection (envelope failures)
    Reply(MessageResponse),
}

/// Decodes inbound frames and executes their commands against storage
#[derive(Clone)]
pub struct EventProtocol {
    storage: Arc<dyn Storage>,
}

impl EventProtocol {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Process one raw inbound frame from `sender`
    pub async fn translate(&self, raw: &str, sender: ConnectionId) -> Translation {
        let envelope: RoomMessage = match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                return Translation::Reply(MessageResponse::action_failed(
                    "unknown",
                    &format!("Failed to decode message: {}", e),
                ));
            }
        };

        let action = if envelope.event.is_empty() { "unknown" } else { envelope.event.as_str() };
        if envelope.room.is_empty() {
            return Translation::Reply(MessageResponse::action_failed(
                action,
                "Missing/empty 'room' field",
            ));
        }
        if envelope.event.is_empty() {
            return Translation::Reply(MessageResponse::action_failed(
                action,
                "Missing/empty 'event' field",
            ));
        }
        let Some(data) = envelope.data.clone() else {
            return Translation::Reply(MessageResponse::action_failed(
                action,
                "Missing/empty 'data' field",
            ));
        };

        match self.dispatch(&envelope.room, &envelope.event, data).await {
            Ok(response) => {
                self.routed(response, &envelope, sender, true, envelope.send_response)
            }
            Err(error) => {
                // {:#} renders the whole context chain, e.g.
                // "Error adding item to database: Room not found"
                let text = format!("{:#}", error);
                logger::warning(
                    LogTag::Sync,
                    &format!("Event '{}' in room {} failed: {}", envelope.event, envelope.room, text),
                );
                let response = MessageResponse::action_failed(&envelope.event, &text);
                // Errors go back to the sender only, regardless of its
                // sendResponse preference.
                self.routed(response, &envelope, sender, false, true)
            }
        }
    }

    fn routed(
        &self,
        response: MessageResponse,
        envelope: &RoomMessage,
        sender: ConnectionId,
        include_other_clients: bool,
        include_sender: bool,
    ) -> Translation {
        match response.to_json() {
            Ok(payload) => Translation::Broadcast(hub::Message {
                room: envelope.room.clone(),
                include_sender,
                include_other_clients,
                sender,
                payload,
            }),
            Err(e) => {
                logger::error(LogTag::Sync, &format!("Failed to encode response: {}", e));
                Translation::Reply(MessageResponse::action_failed(
                    &envelope.event,
                    "Failed to encode response",
                ))
            }
        }
    }

    async fn dispatch(
        &self,
        room: &str,
        event: &str,
        data: Value,
    ) -> anyhow::Result<MessageResponse> {
        match Command::parse(event, data)? {
            Command::AddItem(mut item) => {
                item.id = uuid::Uuid::new_v4().to_string();
                self.storage
                    .add_item(room, item.clone())
                    .await
                    .context("Error adding item to database")?;

                if is_debug_sync_enabled() {
                    logger::debug(LogTag::Sync, &format!("Added item {} to room {}", item.id, room));
                }
                Ok(MessageResponse::new("itemAdded", serde_json::to_value(item)?))
            }

            Command::UpdateItems(items) => {
                if items.is_empty() {
                    bail!("'items' field empty");
                }
                // Entries are applied one at a time; the first failure
                // aborts the rest of the batch but earlier writes stay
                // committed.
                for entry in &items {
                    if entry.id.is_empty() {
                        bail!("Item missing 'id' field");
                    }
                    if entry.updated.is_empty() {
                        bail!("Item 'updated' field missing/empty");
                    }
                    self.storage
                        .update_item_fields(room, &entry.id, &entry.updated)
                        .await
                        .context("Unable to update item in database")?;

                    if is_debug_sync_enabled() {
                        logger::debug(
                            LogTag::Sync,
                            &format!("Updated item {} in room {}", entry.id, room),
                        );
                    }
                }
                Ok(MessageResponse::new(
                    "itemsUpdated",
                    serde_json::json!({ "items": items }),
                ))
            }

            Command::DeleteItem(id) => {
                if id.is_empty() {
                    bail!("Missing 'id' field");
                }
                self.storage
                    .remove_item(room, &id)
                    .await
                    .context("Unable to remove item")?;

                if is_debug_sync_enabled() {
                    logger::debug(LogTag::Sync, &format!("Deleted item {} from room {}", id, room));
                }
                Ok(MessageResponse::new("itemDeleted", serde_json::json!({ "id": id })))
            }

            Command::UpdateLayout(vertices) => {
                // Don't allow updates that reduce the layout to fewer than
                // 3 points
                if vertices.len() < 3 {
                    bail!("Error updating room layout: Not enough vertices");
                }
                self.storage
                    .update_vertices(room, &vertices)
                    .await
                    .context("Error updating room layout in database")?;

                Ok(MessageResponse::new(
                    "layoutUpdated",
                    serde_json::json!({ "vertices": vertices }),
                ))
            }

            Command::CloneRoom { id, target_id } => {
                let cloned = self
                    .storage
                    .clone_room(&id, &target_id)
                    .await
                    .context("Unable to copy the room")?;

                logger::info(
                    LogTag::Sync,
                    &format!("Cloned room {} from {}", id, target_id),
                );
                Ok(MessageResponse::new(
                    "roomCloned",
                    serde_json::json!({ "items": cloned.items, "vertices": cloned.vertices }),
                ))
            }

            Command::UpdateRoomName(name) => {
                self.storage
                    .update_name(room, &name)
                    .await
                    .context("Unable to update the room name")?;

                Ok(MessageResponse::new(
                    "roomNameUpdated",
                    serde_json::json!({ "name": name }),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use serde_json::json;

    async fn protocol_with_room() -> (EventProtocol, Arc<Database>) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.create_room("r1", "Dorm").await.unwrap();
        (EventProtocol::new(db.clone()), db)
    }

    fn frame(room: &str, event: &str, send_response: bool, data: Value) -> String {
        json!({ "room": room, "event": event, "sendResponse": send_response, "data": data })
            .to_string()
    }

    fn expect_broadcast(translation: Translation) -> hub::Message {
        match translation {
            Translation::Broadcast(message) => message,
            Translation::Reply(reply) => panic!("expected broadcast, got reply: {:?}", reply),
        }
    }

    fn expect_reply(translation: Translation) -> MessageResponse {
        match translation {
            Translation::Reply(reply) => reply,
            Translation::Broadcast(message) => {
                panic!("expected reply, got broadcast: {:?}", message)
            }
        }
    }

    fn payload_of(message: &hub::Message) -> Value {
        serde_json::from_str(&message.payload).unwrap()
    }

    #[tokio::test]
    async fn test_add_item_broadcasts_created_item() {
        let (protocol, db) = protocol_with_room().await;

        let raw = frame("r1", "addItem", true, json!({"name": "Chair", "quantity": 2}));
        let message = expect_broadcast(protocol.translate(&raw, 1).await);

        assert!(message.include_sender);
        assert!(message.include_other_clients);
        assert_eq!(message.sender, 1);

        let payload = payload_of(&message);
        assert_eq!(payload["event"], "itemAdded");
        assert_eq!(payload["data"]["name"], "Chair");
        assert_eq!(payload["data"]["quantity"], 2);

        let created_id = payload["data"]["id"].as_str().unwrap().to_string();
        assert!(!created_id.is_empty());

        let room = db.get_room("r1").await.unwrap();
        assert_eq!(room.items.len(), 1);
        assert_eq!(room.items[0].id, created_id);
    }

    #[tokio::test]
    async fn test_add_item_ignores_client_supplied_id() {
        let (protocol, db) = protocol_with_room().await;

        let raw = frame("r1", "addItem", false, json!({"id": "forged", "name": "Desk"}));
        expect_broadcast(protocol.translate(&raw, 1).await);

        let room = db.get_room("r1").await.unwrap();
        assert_ne!(room.items[0].id, "forged");
    }

    #[tokio::test]
    async fn test_send_response_false_suppresses_echo() {
        let (protocol, _db) = protocol_with_room().await;

        let raw = frame("r1", "addItem", false, json!({"name": "Rug"}));
        let message = expect_broadcast(protocol.translate(&raw, 1).await);

        assert!(!message.include_sender);
        assert!(message.include_other_clients);
    }

    #[tokio::test]
    async fn test_handler_failure_is_sender_only_action_failed() {
        let (protocol, _db) = protocol_with_room().await;

        let raw = frame("ghost", "addItem", false, json!({"name": "Chair"}));
        let message = expect_broadcast(protocol.translate(&raw, 1).await);

        // Errors override sendResponse and never reach other clients.
        assert!(message.include_sender);
        assert!(!message.include_other_clients);

        let payload = payload_of(&message);
        assert_eq!(payload["event"], "actionFailed");
        assert_eq!(payload["data"]["action"], "addItem");
        let text = payload["data"]["message"].as_str().unwrap();
        assert!(text.starts_with("Error adding item to database"), "got: {text}");
        assert!(text.contains("Room not found"), "got: {text}");
    }

    #[tokio::test]
    async fn test_envelope_failures_reply_without_broadcast() {
        let (protocol, _db) = protocol_with_room().await;

        let reply = expect_reply(protocol.translate("not json", 1).await);
        assert_eq!(reply.data["action"], "unknown");

        let raw = frame("", "addItem", true, json!({}));
        let reply = expect_reply(protocol.translate(&raw, 1).await);
        assert_eq!(reply.data["action"], "addItem");
        assert_eq!(reply.data["message"], "Missing/empty 'room' field");

        let raw = frame("r1", "", true, json!({}));
        let reply = expect_reply(protocol.translate(&raw, 1).await);
        assert_eq!(reply.data["action"], "unknown");
        assert_eq!(reply.data["message"], "Missing/empty 'event' field");

        let raw = json!({ "room": "r1", "event": "addItem", "sendResponse": true }).to_string();
        let reply = expect_reply(protocol.translate(&raw, 1).await);
        assert_eq!(reply.data["message"], "Missing/empty 'data' field");
    }

    #[tokio::test]
    async fn test_unknown_event_fails() {
        let (protocol, _db) = protocol_with_room().await;

        let raw = frame("r1", "teleportItem", true, json!({}));
        let message = expect_broadcast(protocol.translate(&raw, 1).await);

        let payload = payload_of(&message);
        assert_eq!(payload["event"], "actionFailed");
        assert_eq!(payload["data"]["action"], "teleportItem");
        assert_eq!(payload["data"]["message"], "Unknown event 'teleportItem'");
        assert!(!message.include_other_clients);
    }

    #[tokio::test]
    async fn test_update_layout_rejects_degenerate_polygon() {
        let (protocol, db) = protocol_with_room().await;

        let two = json!({"vertices": [{"x": 0, "y": 0}, {"x": 1, "y": 0}]});
        let message = expect_broadcast(protocol.translate(&frame("r1", "updateLayout", true, two), 1).await);
        let payload = payload_of(&message);
        assert_eq!(payload["event"], "actionFailed");
        assert!(payload["data"]["message"]
            .as_str()
            .unwrap()
            .contains("Not enough vertices"));

        let three =
            json!({"vertices": [{"x": 0, "y": 0}, {"x": 1, "y": 0}, {"x": 0, "y": 1}]});
        let message =
            expect_broadcast(protocol.translate(&frame("r1", "updateLayout", true, three), 1).await);
        let payload = payload_of(&message);
        assert_eq!(payload["event"], "layoutUpdated");
        assert_eq!(payload["data"]["vertices"].as_array().unwrap().len(), 3);

        assert_eq!(db.get_room("r1").await.unwrap().vertices.len(), 3);
    }

    #[tokio::test]
    async fn test_update_items_batch_success() {
        let (protocol, db) = protocol_with_room().await;
        for id in ["a", "b"] {
            db.add_item("r1", RoomItem { id: id.to_string(), ..Default::default() })
                .await
                .unwrap();
        }

        let data = json!({"items": [
            {"id": "a", "updated": {"quantity": 4}},
            {"id": "b", "updated": {"name": "Shelf"}},
        ]});
        let message =
            expect_broadcast(protocol.translate(&frame("r1", "updateItems", true, data), 1).await);

        let payload = payload_of(&message);
        assert_eq!(payload["event"], "itemsUpdated");
        assert_eq!(payload["data"]["items"].as_array().unwrap().len(), 2);

        let room = db.get_room("r1").await.unwrap();
        assert_eq!(room.items[0].quantity, 4);
        assert_eq!(room.items[1].name, "Shelf");
    }

    #[tokio::test]
    async fn test_update_items_partial_commit_on_failure() {
        let (protocol, db) = protocol_with_room().await;
        db.add_item("r1", RoomItem { id: "a".to_string(), ..Default::default() })
            .await
            .unwrap();

        let data = json!({"items": [
            {"id": "a", "updated": {"quantity": 9}},
            {"id": "missing", "updated": {"quantity": 1}},
        ]});
        let message =
            expect_broadcast(protocol.translate(&frame("r1", "updateItems", true, data), 1).await);

        let payload = payload_of(&message);
        assert_eq!(payload["event"], "actionFailed");
        assert_eq!(payload["data"]["action"], "updateItems");

        // Entry #1 stays committed even though the batch failed: no
        // rollback, by contract.
        let room = db.get_room("r1").await.unwrap();
        assert_eq!(room.items[0].quantity, 9);
    }

    #[tokio::test]
    async fn test_update_items_validates_entries() {
        let (protocol, _db) = protocol_with_room().await;

        let empty = json!({"items": []});
        let message =
            expect_broadcast(protocol.translate(&frame("r1", "updateItems", true, empty), 1).await);
        assert_eq!(payload_of(&message)["data"]["message"], "'items' field empty");

        let no_id = json!({"items": [{"updated": {"quantity": 1}}]});
        let message =
            expect_broadcast(protocol.translate(&frame("r1", "updateItems", true, no_id), 1).await);
        assert_eq!(payload_of(&message)["data"]["message"], "Item missing 'id' field");

        let no_fields = json!({"items": [{"id": "a", "updated": {}}]});
        let message = expect_broadcast(
            protocol.translate(&frame("r1", "updateItems", true, no_fields), 1).await,
        );
        assert_eq!(
            payload_of(&message)["data"]["message"],
            "Item 'updated' field missing/empty"
        );
    }

    #[tokio::test]
    async fn test_delete_item() {
        let (protocol, db) = protocol_with_room().await;
        db.add_item("r1", RoomItem { id: "a".to_string(), ..Default::default() })
            .await
            .unwrap();

        let message = expect_broadcast(
            protocol.translate(&frame("r1", "deleteItem", true, json!({"id": "a"})), 1).await,
        );
        let payload = payload_of(&message);
        assert_eq!(payload["event"], "itemDeleted");
        assert_eq!(payload["data"]["id"], "a");
        assert!(db.get_room("r1").await.unwrap().items.is_empty());

        let message = expect_broadcast(
            protocol.translate(&frame("r1", "deleteItem", true, json!({"id": "a"})), 1).await,
        );
        assert_eq!(payload_of(&message)["event"], "actionFailed");
    }

    #[tokio::test]
    async fn test_clone_room_copies_contents_with_fresh_ids() {
        let (protocol, db) = protocol_with_room().await;
        db.create_room("template", "Showroom").await.unwrap();
        db.add_item("template", RoomItem { id: "t1".to_string(), name: "Sofa".to_string(), ..Default::default() })
            .await
            .unwrap();

        let data = json!({"id": "r1", "targetId": "template"});
        let message =
            expect_broadcast(protocol.translate(&frame("r1", "cloneRoom", true, data), 1).await);

        let payload = payload_of(&message);
        assert_eq!(payload["event"], "roomCloned");
        let items = payload["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "Sofa");
        assert_ne!(items[0]["id"], "t1");

        let message = expect_broadcast(
            protocol
                .translate(&frame("r1", "cloneRoom", true, json!({"id": "r1", "targetId": "nope"})), 1)
                .await,
        );
        let payload = payload_of(&message);
        assert_eq!(payload["event"], "actionFailed");
        assert!(payload["data"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Unable to copy the room"));
    }

    #[tokio::test]
    async fn test_added_items_get_unique_ids() {
        let (protocol, db) = protocol_with_room().await;

        for _ in 0..4 {
            let raw = frame("r1", "addItem", false, json!({"name": "Crate"}));
            expect_broadcast(protocol.translate(&raw, 1).await);
        }

        let mut ids: Vec<String> =
            db.get_room("r1").await.unwrap().items.into_iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), 4);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[tokio::test]
    async fn test_add_item_scenario_through_live_hub() {
        use crate::webserver::ws::hub::{ Hub, Subscriber };
        use tokio::sync::mpsc;
        use tokio::time::{ timeout, Duration };

        let (protocol, _db) = protocol_with_room().await;
        let handle = Hub::spawn();

        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        let sender_id = handle.next_connection_id();
        let other_id = handle.next_connection_id();
        handle.join("r1", Subscriber { id: sender_id, queue: tx1 });
        handle.join("r1", Subscriber { id: other_id, queue: tx2 });

        let raw = frame(
            "r1",
            "addItem",
            true,
            json!({"name": "Chair", "quantity": 2}),
        );
        match protocol.translate(&raw, sender_id).await {
            Translation::Broadcast(message) => handle.publish(message),
            Translation::Reply(reply) => panic!("unexpected reply: {:?}", reply),
        }

        // Both the sender (sendResponse=true) and the other subscriber
        // observe the broadcast.
        for rx in [&mut rx1, &mut rx2] {
            let received = timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("receive timed out")
                .expect("queue closed");
            let value: Value = serde_json::from_str(&received).unwrap();
            assert_eq!(value["event"], "itemAdded");
            assert_eq!(value["data"]["name"], "Chair");
            assert_eq!(value["data"]["quantity"], 2);
        }
    }

    #[tokio::test]
    async fn test_update_room_name() {
        let (protocol, db) = protocol_with_room().await;

        let message = expect_broadcast(
            protocol
                .translate(&frame("r1", "updateRoomName", true, json!({"name": "New Name"})), 1)
                .await,
        );
        let payload = payload_of(&message);
        assert_eq!(payload["event"], "roomNameUpdated");
        assert_eq!(payload["data"]["name"], "New Name");
        assert_eq!(db.get_room("r1").await.unwrap().name, "New Name");
    }
}
