/// Health and status routes
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{ Json, Router };

use crate::webserver::models::{ HealthResponse, StatusResponse };
use crate::webserver::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health)).route("/status", get(status))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        timestamp: chrono::Utc::now(),
        uptime_seconds: state.uptime_seconds(),
        ws_connections: state.ws_connection_count().await,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
