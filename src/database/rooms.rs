/// Room and item storage operations
use anyhow::{ anyhow, Result };
use rusqlite::{ params, Connection, OptionalExtension, Row };
use serde_json::{ Map, Value };

use crate::database::connection::Database;
use crate::models::{ EditorPoint, Room, RoomItem };
use crate::patch;
use crate::storage::{ NotFound, Storage };

impl Database {
    fn room_row(&self, conn: &Connection, id: &str) -> Result<Room> {
        let room = conn
            .query_row(
                "SELECT id, name, vertices, template_id FROM rooms WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        let (id, name, vertices_json, template_id) = room.ok_or(NotFound("Room"))?;
        let vertices: Vec<EditorPoint> = serde_json::from_str(&vertices_json)?;

        Ok(Room { id, name, items: Vec::new(), vertices, template_id })
    }

    fn room_items(&self, conn: &Connection, room_id: &str) -> Result<Vec<RoomItem>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, quantity, claimed_by, visible_in_editor,
                    width, length, height, pos_x, pos_y, rotation, locked, z_index
             FROM items WHERE room_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![room_id], item_from_row)?;

        let mut items = Vec::new();
        for item in rows {
            items.push(item?);
        }
        Ok(items)
    }

    fn require_room(&self, conn: &Connection, room_id: &str) -> Result<()> {
        let exists: Option<i64> = conn
            .query_row("SELECT 1 FROM rooms WHERE id = ?1", params![room_id], |row| row.get(0))
            .optional()?;
        exists.map(|_| ()).ok_or_else(|| anyhow!(NotFound("Room")))
    }

    fn item_row(&self, conn: &Connection, room_id: &str, item_id: &str) -> Result<RoomItem> {
        conn.query_row(
            "SELECT id, name, quantity, claimed_by, visible_in_editor,
                    width, length, height, pos_x, pos_y, rotation, locked, z_index
             FROM items WHERE room_id = ?1 AND id = ?2",
            params![room_id, item_id],
            item_from_row,
        )
        .optional()?
        .ok_or_else(|| anyhow!(NotFound("Item")))
    }

    fn insert_item(&self, conn: &Connection, room_id: &str, item: &RoomItem) -> Result<()> {
        conn.execute(
            "INSERT INTO items (id, room_id, name, quantity, claimed_by, visible_in_editor,
                                width, length, height, pos_x, pos_y, rotation, locked, z_index)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                item.id,
                room_id,
                item.name,
                item.quantity,
                item.claimed_by,
                item.visible_in_editor,
                item.dimensions.width,
                item.dimensions.length,
                item.dimensions.height,
                item.editor_position.x,
                item.editor_position.y,
                item.editor_rotation,
                item.editor_locked,
                item.editor_z_index
            ],
        )?;
        Ok(())
    }
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<RoomItem> {
    Ok(RoomItem {
        id: row.get(0)?,
        name: row.get(1)?,
        quantity: row.get(2)?,
        claimed_by: row.get(3)?,
        visible_in_editor: row.get(4)?,
        dimensions: crate::models::ItemDimensions {
            width: row.get(5)?,
            length: row.get(6)?,
            height: row.get(7)?,
        },
        editor_position: EditorPoint { x: row.get(8)?, y: row.get(9)? },
        editor_rotation: row.get(10)?,
        editor_locked: row.get(11)?,
        editor_z_index: row.get(12)?,
    })
}

#[async_trait::async_trait]
impl Storage for Database {
    async fn create_room(&self, id: &str, name: &str) -> Result<Room> {
        let room = Room::new(id, name);
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO rooms (id, name, vertices) VALUES (?1, ?2, ?3)",
            params![room.id, room.name, serde_json::to_string(&room.vertices)?],
        )?;
        Ok(room)
    }

    async fn get_room(&self, id: &str) -> Result<Room> {
        let conn = self.conn.lock().unwrap();
        let mut room = self.room_row(&conn, id)?;
        room.items = self.room_items(&conn, id)?;
        Ok(room)
    }

    async fn add_item(&self, room_id: &str, item: RoomItem) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        self.require_room(&conn, room_id)?;
        self.insert_item(&conn, room_id, &item)
    }

    async fn remove_item(&self, room_id: &str, item_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute(
            "DELETE FROM items WHERE room_id = ?1 AND id = ?2",
            params![room_id, item_id],
        )?;
        if removed == 0 {
            return Err(anyhow!(NotFound("Item")));
        }
        Ok(())
    }

    async fn update_item_fields(
        &self,
        room_id: &str,
        item_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<RoomItem> {
        let conn = self.conn.lock().unwrap();
        let mut item = self.item_row(&conn, room_id, item_id)?;

        patch::apply_updates(&mut item, fields)?;

        conn.execute(
            "UPDATE items SET name = ?3, quantity = ?4, claimed_by = ?5, visible_in_editor = ?6,
                              width = ?7, length = ?8, height = ?9, pos_x = ?10, pos_y = ?11,
                              rotation = ?12, locked = ?13, z_index = ?14
             WHERE room_id = ?1 AND id = ?2",
            params![
                room_id,
                item_id,
                item.name,
                item.quantity,
                item.claimed_by,
                item.visible_in_editor,
                item.dimensions.width,
                item.dimensions.length,
                item.dimensions.height,
                item.editor_position.x,
                item.editor_position.y,
                item.editor_rotation,
                item.editor_locked,
                item.editor_z_index
            ],
        )?;

        Ok(item)
    }

    async fn update_vertices(&self, room_id: &str, vertices: &[EditorPoint]) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE rooms SET vertices = ?2 WHERE id = ?1",
            params![room_id, serde_json::to_string(vertices)?],
        )?;
        if updated == 0 {
            return Err(anyhow!(NotFound("Room")));
        }
        Ok(())
    }

    async fn update_name(&self, room_id: &str, name: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated =
            conn.execute("UPDATE rooms SET name = ?2 WHERE id = ?1", params![room_id, name])?;
        if updated == 0 {
            return Err(anyhow!(NotFound("Room")));
        }
        Ok(())
    }

    async fn clear_items(&self, room_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        self.require_room(&conn, room_id)?;
        conn.execute("DELETE FROM items WHERE room_id = ?1", params![room_id])?;
        Ok(())
    }

    async fn set_template_id(&self, room_id: &str, template_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE rooms SET template_id = ?2 WHERE id = ?1",
            params![room_id, template_id],
        )?;
        if updated == 0 {
            return Err(anyhow!(NotFound("Room")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn database() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn chair() -> RoomItem {
        RoomItem {
            id: "item-1".to_string(),
            name: "Chair".to_string(),
            quantity: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get_room() {
        let db = database();
        db.create_room("r1", "Dorm").await.unwrap();

        let room = db.get_room("r1").await.unwrap();
        assert_eq!(room.name, "Dorm");
        assert_eq!(room.vertices.len(), 4);
        assert!(room.items.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_room_is_not_found() {
        let db = database();
        let err = db.get_room("nope").await.unwrap_err();
        assert!(err.downcast_ref::<NotFound>().is_some());
    }

    #[tokio::test]
    async fn test_add_and_remove_item() {
        let db = database();
        db.create_room("r1", "Dorm").await.unwrap();
        db.add_item("r1", chair()).await.unwrap();

        let room = db.get_room("r1").await.unwrap();
        assert_eq!(room.items.len(), 1);
        assert_eq!(room.items[0].name, "Chair");

        db.remove_item("r1", "item-1").await.unwrap();
        assert!(db.get_room("r1").await.unwrap().items.is_empty());

        let err = db.remove_item("r1", "item-1").await.unwrap_err();
        assert!(err.downcast_ref::<NotFound>().is_some());
    }

    #[tokio::test]
    async fn test_add_item_to_missing_room_fails() {
        let db = database();
        let err = db.add_item("nope", chair()).await.unwrap_err();
        assert!(err.downcast_ref::<NotFound>().is_some());
    }

    #[tokio::test]
    async fn test_items_keep_insertion_order() {
        let db = database();
        db.create_room("r1", "Dorm").await.unwrap();
        for n in 0..5 {
            let item = RoomItem {
                id: format!("item-{n}"),
                name: format!("Item {n}"),
                ..Default::default()
            };
            db.add_item("r1", item).await.unwrap();
        }

        let ids: Vec<String> =
            db.get_room("r1").await.unwrap().items.into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["item-0", "item-1", "item-2", "item-3", "item-4"]);
    }

    #[tokio::test]
    async fn test_update_item_fields_persists_patch() {
        let db = database();
        db.create_room("r1", "Dorm").await.unwrap();
        db.add_item("r1", chair()).await.unwrap();

        let fields = json!({"quantity": 5, "dimensions": {"width": 2.5}});
        let updated = db
            .update_item_fields("r1", "item-1", fields.as_object().unwrap())
            .await
            .unwrap();
        assert_eq!(updated.quantity, 5);
        assert_eq!(updated.dimensions.width, 2.5);

        let stored = db.get_room("r1").await.unwrap().items.remove(0);
        assert_eq!(stored.quantity, 5);
        assert_eq!(stored.dimensions.width, 2.5);
        assert_eq!(stored.name, "Chair");
    }

    #[tokio::test]
    async fn test_update_fields_of_missing_item_fails() {
        let db = database();
        db.create_room("r1", "Dorm").await.unwrap();

        let fields = json!({"quantity": 5});
        let err = db
            .update_item_fields("r1", "ghost", fields.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<NotFound>().is_some());
    }

    #[tokio::test]
    async fn test_update_vertices_and_name() {
        let db = database();
        db.create_room("r1", "Dorm").await.unwrap();

        let triangle = vec![
            EditorPoint { x: 0.0, y: 0.0 },
            EditorPoint { x: 4.0, y: 0.0 },
            EditorPoint { x: 0.0, y: 4.0 },
        ];
        db.update_vertices("r1", &triangle).await.unwrap();
        db.update_name("r1", "Renamed").await.unwrap();

        let room = db.get_room("r1").await.unwrap();
        assert_eq!(room.vertices, triangle);
        assert_eq!(room.name, "Renamed");
    }

    #[tokio::test]
    async fn test_clone_room_generates_fresh_item_ids() {
        let db = database();
        db.create_room("source", "Template").await.unwrap();
        db.create_room("dest", "Mine").await.unwrap();

        db.add_item("source", chair()).await.unwrap();
        db.add_item(
            "dest",
            RoomItem { id: "old".to_string(), name: "Old".to_string(), ..Default::default() },
        )
        .await
        .unwrap();

        let cloned = db.clone_room("dest", "source").await.unwrap();
        assert_eq!(cloned.items.len(), 1);
        assert_eq!(cloned.items[0].name, "Chair");
        assert_ne!(cloned.items[0].id, "item-1");
        assert_eq!(cloned.template_id.as_deref(), Some("source"));
        // destination keeps its own name
        assert_eq!(cloned.name, "Mine");
    }
}
