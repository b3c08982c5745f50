/// Room and item models shared by the sync protocol, storage and REST layers
///
/// Field names follow the wire format expected by editor clients, so every
/// struct serializes with camelCase keys.
use serde::{ Deserialize, Serialize };

/// A 2D point in editor coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EditorPoint {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Physical dimensions of a placeable item
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemDimensions {
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub height: f64,
}

/// A placeable, claimable entity inside a room
///
/// `id` is unique within its room and immutable after creation. Clients may
/// omit any other field when creating an item; missing fields default to
/// their zero values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub claimed_by: String,
    #[serde(default)]
    pub visible_in_editor: bool,
    #[serde(default)]
    pub dimensions: ItemDimensions,
    #[serde(default)]
    pub editor_position: EditorPoint,
    #[serde(default)]
    pub editor_rotation: f64,
    #[serde(default)]
    pub editor_locked: bool,
    #[serde(default)]
    pub editor_z_index: f64,
}

/// A named shared editing session: a layout polygon plus its items
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<RoomItem>,
    #[serde(default)]
    pub vertices: Vec<EditorPoint>,
    /// Room this one was last cloned from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

impl Room {
    /// Create an empty room with the default 10x10 square layout
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            items: Vec::new(),
            vertices: Self::default_vertices(),
            template_id: None,
        }
    }

    /// Unless another arrangement is provided, the default room layout is
    /// a 10x10 square
    pub fn default_vertices() -> Vec<EditorPoint> {
        vec![
            EditorPoint { x: 0.0, y: 0.0 },
            EditorPoint { x: 10.0, y: 0.0 },
            EditorPoint { x: 10.0, y: 10.0 },
            EditorPoint { x: 0.0, y: 10.0 },
        ]
    }
}
