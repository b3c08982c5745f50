/// Axum webserver implementation
///
/// Main server lifecycle management including startup, shutdown, and
/// graceful termination
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;

use crate::config::with_config;
use crate::logger::{ self, LogTag };
use crate::storage::Storage;
use crate::webserver::routes;
use crate::webserver::state::AppState;
use crate::webserver::ws::Hub;

/// Global shutdown notifier
static SHUTDOWN_NOTIFY: once_cell::sync::Lazy<Arc<Notify>> =
    once_cell::sync::Lazy::new(|| Arc::new(Notify::new()));

/// Start the webserver
///
/// Spawns the hub task, binds the listener and blocks until the server is
/// shut down.
pub async fn start_server(storage: Arc<dyn Storage>) -> Result<(), String> {
    let config = with_config(|cfg| cfg.webserver.clone());
    let (host, port) = (config.host.clone(), config.port);

    let hub = Hub::spawn();
    let state = Arc::new(AppState::new(config, storage, hub));

    let app = build_app(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| format!("Invalid bind address: {}", e))?;

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        match e.kind() {
            std::io::ErrorKind::AddrInUse => {
                format!(
                    "Failed to bind to {}: Address already in use\n\
                     Another roomsync instance is probably running on this port.",
                    addr
                )
            }
            std::io::ErrorKind::PermissionDenied => {
                format!(
                    "Failed to bind to {}: Permission denied\n\
                     Port {} requires elevated privileges on this system.",
                    addr, port
                )
            }
            _ => format!("Failed to bind to {}: {}", addr, e),
        }
    })?;

    logger::info(LogTag::Webserver, &format!("🌐 Listening on http://{}", addr));
    logger::info(LogTag::Webserver, &format!("📡 Sync endpoint at ws://{}/ws?id=<room>", addr));

    // Run the server with graceful shutdown
    let shutdown_signal = async {
        SHUTDOWN_NOTIFY.notified().await;
        logger::info(LogTag::Webserver, "Received shutdown signal, stopping webserver...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    logger::info(LogTag::Webserver, "✅ Webserver stopped gracefully");

    Ok(())
}

/// Trigger webserver shutdown
pub fn shutdown() {
    SHUTDOWN_NOTIFY.notify_one();
}

/// Build the Axum application with all routes and middleware
fn build_app(state: Arc<AppState>) -> Router {
    // Editor clients connect from anywhere; the protocol carries no
    // credentials, so an open CORS policy matches the trust model.
    routes::create_router(state).layer(CorsLayer::permissive())
}
