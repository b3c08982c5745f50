/// Shared application state for the webserver
///
/// Holds the handles every route and connection needs: the storage seam,
/// the hub handle and a few counters for the status endpoint.
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::WebserverConfig;
use crate::storage::Storage;
use crate::webserver::ws::HubHandle;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    /// Webserver configuration
    pub config: Arc<WebserverConfig>,

    /// Persistence backend shared with the sync protocol
    pub storage: Arc<dyn Storage>,

    /// Handle to the room hub task
    pub hub: HubHandle,

    /// Active WebSocket connection count
    pub ws_connections: Arc<RwLock<usize>>,

    /// Server startup time
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: WebserverConfig, storage: Arc<dyn Storage>, hub: HubHandle) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            hub,
            ws_connections: Arc::new(RwLock::new(0)),
            startup_time: chrono::Utc::now(),
        }
    }

    /// Get current WebSocket connection count
    pub async fn ws_connection_count(&self) -> usize {
        *self.ws_connections.read().await
    }

    /// Increment WebSocket connection count
    pub async fn increment_ws_connections(&self) {
        let mut count = self.ws_connections.write().await;
        *count += 1;
    }

    /// Decrement WebSocket connection count
    pub async fn decrement_ws_connections(&self) {
        let mut count = self.ws_connections.write().await;
        if *count > 0 {
            *count -= 1;
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (chrono::Utc::now() - self.startup_time).num_seconds().max(0) as u64
    }
}
