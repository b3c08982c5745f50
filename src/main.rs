use std::sync::Arc;

use roomsync::arguments::{ self, patterns, print_debug_info, print_help };
use roomsync::config;
use roomsync::database::Database;
use roomsync::logger::{ self, LogTag };
use roomsync::webserver;

/// Main entry point for roomsync
///
/// Startup order matters: directories first (the logger writes a file),
/// then the logger, then config, then the database, then the webserver
/// with its hub. Ctrl-C triggers a graceful shutdown.
#[tokio::main]
async fn main() {
    // Ensure all directories exist BEFORE logger initialization
    if let Err(e) = roomsync::paths::ensure_all_directories() {
        eprintln!("❌ Failed to create required directories: {}", e);
        std::process::exit(1);
    }

    logger::init();

    if patterns::is_help_requested() {
        print_help();
        std::process::exit(0);
    }

    logger::info(LogTag::System, "🚀 roomsync starting up...");
    print_debug_info();

    // Load configuration, honoring --config and --port overrides
    let config_path = arguments::get_config_path_override()
        .unwrap_or_else(|| config::CONFIG_FILE_PATH.to_string());
    if let Err(e) = config::load_config_from_path(&config_path) {
        logger::error(LogTag::Config, &format!("❌ {}", e));
        std::process::exit(1);
    }
    if let Some(port) = arguments::get_port_override() {
        let mut loaded = config::with_config(|cfg| cfg.clone());
        loaded.webserver.port = port;
        config::set_config(loaded);
    }

    // Open the database
    let db_path = config::with_config(|cfg| cfg.database.path.clone());
    let database = match Database::open(&db_path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            logger::error(LogTag::Database, &format!("❌ Failed to open database: {}", e));
            std::process::exit(1);
        }
    };

    // Ctrl-C stops the webserver gracefully
    if let Err(e) = ctrlc::set_handler(|| {
        logger::info(LogTag::System, "Received Ctrl-C, shutting down...");
        webserver::shutdown();
    }) {
        logger::warning(LogTag::System, &format!("Could not install Ctrl-C handler: {}", e));
    }

    match webserver::start_server(database).await {
        Ok(()) => {
            logger::info(LogTag::System, "✅ roomsync stopped");
            logger::flush();
        }
        Err(e) => {
            logger::error(LogTag::System, &format!("❌ {}", e));
            logger::flush();
            std::process::exit(1);
        }
    }
}
