/// Configuration schema definitions
use crate::config_struct;

// ============================================================================
// WEBSERVER CONFIGURATION
// ============================================================================

config_struct! {
    /// HTTP/WebSocket server configuration
    pub struct WebserverConfig {
        /// Host/IP address to bind: 127.0.0.1 = localhost only,
        /// 0.0.0.0 = all interfaces
        host: String = "127.0.0.1".to_string(),

        /// Port to bind the webserver
        port: u16 = 8080,
    }
}

// ============================================================================
// SYNC CONFIGURATION
// ============================================================================

config_struct! {
    /// Real-time sync engine tuning
    pub struct SyncConfig {
        /// Pending envelopes allowed per connection before the hub evicts
        /// the subscriber
        outbound_queue_capacity: usize = 256,

        /// Maximum size of a single inbound frame in bytes
        max_frame_bytes: usize = 512,

        /// Close a connection when nothing arrives for this long.
        /// Keep-alive pings go out at 9/10 of this interval.
        read_idle_timeout_secs: u64 = 60,
    }
}

// ============================================================================
// DATABASE CONFIGURATION
// ============================================================================

config_struct! {
    /// Persistence configuration
    pub struct DatabaseConfig {
        /// Path of the SQLite database file
        path: String = "data/roomsync.db".to_string(),
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration tree, one section per subsystem
    pub struct Config {
        webserver: WebserverConfig = WebserverConfig::default(),
        sync: SyncConfig = SyncConfig::default(),
        database: DatabaseConfig = DatabaseConfig::default(),
    }
}
