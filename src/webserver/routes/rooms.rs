/// Room API routes
///
/// Thin wrappers over the storage seam for room creation and lookup. All
/// real-time mutation runs through the WebSocket protocol instead.
use std::sync::Arc;

use axum::extract::{ Query, State };
use axum::http::StatusCode;
use axum::response::{ IntoResponse, Response };
use axum::routing::{ get, post };
use axum::{ Json, Router };

use crate::logger::{ self, LogTag };
use crate::storage::NotFound;
use crate::webserver::models::{ AddItemRequest, CloneRoomQuery, CreateRoomRequest, ErrorResponse, GetRoomQuery };
use crate::webserver::state::AppState;

/// Create room routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/room/create", post(create_room))
        .route("/room/get", get(get_room))
        .route("/room/clone", get(clone_room))
        .route("/room/add", post(add_item))
}

/// Create an empty room with a server-generated id
async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Response {
    let id = uuid::Uuid::new_v4().to_string();
    match state.storage.create_room(&id, &request.name).await {
        Ok(room) => {
            logger::info(LogTag::Webserver, &format!("Created room {} ('{}')", room.id, room.name));
            Json(room).into_response()
        }
        Err(e) => storage_error(e),
    }
}

/// Fetch a room with its items
async fn get_room(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GetRoomQuery>,
) -> Response {
    match state.storage.get_room(&query.id).await {
        Ok(room) => Json(room).into_response(),
        Err(e) => storage_error(e),
    }
}

/// Replace a room's contents with a copy of another room
async fn clone_room(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CloneRoomQuery>,
) -> Response {
    match state.storage.clone_room(&query.id, &query.target_id).await {
        Ok(room) => {
            logger::info(
                LogTag::Webserver,
                &format!("Cloned room {} from {}", query.id, query.target_id),
            );
            Json(room).into_response()
        }
        Err(e) => storage_error(e),
    }
}

/// Append an item to a room
async fn add_item(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddItemRequest>,
) -> Response {
    let mut item = request.item;
    item.id = uuid::Uuid::new_v4().to_string();

    match state.storage.add_item(&request.room, item.clone()).await {
        Ok(()) => Json(item).into_response(),
        Err(e) => storage_error(e),
    }
}

fn storage_error(error: anyhow::Error) -> Response {
    let status = if error.downcast_ref::<NotFound>().is_some() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ErrorResponse { error: format!("{:#}", error) })).into_response()
}
