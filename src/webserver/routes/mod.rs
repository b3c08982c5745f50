use std::sync::Arc;

use axum::Router;

use crate::webserver::state::AppState;

pub mod rooms;
pub mod status;
pub mod ws;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(ws::routes())
        .nest("/api", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new().merge(rooms::routes()).merge(status::routes())
}
