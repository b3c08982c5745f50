/// WebSocket upgrade route
///
/// Clients open one socket per room: `GET /ws?id=<room id>`. The upgrade
/// caps the inbound frame size; everything past the handshake lives in
/// `ws::connection`.
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ Query, State };
use axum::http::StatusCode;
use axum::response::{ IntoResponse, Response };
use axum::routing::get;
use axum::{ Json, Router };
use serde::Deserialize;

use crate::arguments::is_debug_webserver_enabled;
use crate::logger::{ self, LogTag };
use crate::webserver::models::ErrorResponse;
use crate::webserver::state::AppState;
use crate::webserver::ws::connection::{ self, ConnectionSettings };

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Room to subscribe to
    #[serde(default)]
    pub id: String,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(ws_handler))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    if query.id.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: "Missing room 'id' query parameter".to_string() }),
        )
            .into_response();
    }

    let settings = ConnectionSettings::from_config();

    state.increment_ws_connections().await;
    if is_debug_webserver_enabled() {
        let active = state.ws_connection_count().await;
        logger::debug(
            LogTag::Webserver,
            &format!("WebSocket connection opened for room {} (active_ws={})", query.id, active),
        );
    }

    // Oversized frames become a protocol error on the read side, which
    // tears the connection down.
    ws.max_message_size(settings.max_frame_bytes)
        .max_frame_size(settings.max_frame_bytes)
        .on_upgrade(move |socket| async move {
            connection::handle_socket(socket, state.clone(), query.id).await;
            state.decrement_ws_connections().await;
        })
}
