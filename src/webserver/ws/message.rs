/// Wire message schema for the sync protocol
///
/// Inbound frames carry a routing envelope around an event-specific data
/// payload; outbound frames are a bare {event, data} pair. Exactly one
/// outbound response is produced per processed command, success or failure.
use serde::{ Deserialize, Serialize };
use serde_json::Value;

/// Inbound wire envelope
///
/// ```json
/// { "room": "abc", "event": "addItem", "sendResponse": true, "data": {...} }
/// ```
///
/// All fields are defaulted so envelope validation can report which part is
/// missing instead of failing the whole decode.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomMessage {
    #[serde(default)]
    pub room: String,

    #[serde(default)]
    pub event: String,

    /// Whether the sender wants its own command echoed back to it
    #[serde(default, rename = "sendResponse")]
    pub send_response: bool,

    /// Event-specific payload, absent when the client omitted it
    #[serde(default)]
    pub data: Option<Value>,
}

/// Outbound response envelope
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub event: String,
    pub data: Value,
}

impl MessageResponse {
    pub fn new(event: &str, data: Value) -> Self {
        Self { event: event.to_string(), data }
    }

    /// Build the uniform failure response for a command
    pub fn action_failed(action: &str, message: &str) -> Self {
        Self {
            event: "actionFailed".to_string(),
            data: serde_json::json!({
                "action": action,
                "message": message,
            }),
        }
    }

    /// Serialize to JSON text
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
