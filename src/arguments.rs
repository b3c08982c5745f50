/// Centralized argument handling
///
/// Consolidates command-line argument parsing and debug flag checking so
/// every module asks the same source. Arguments are captured once into a
/// global store; tests and the debug binary can override them.
use std::env;
use std::sync::Mutex;

use once_cell::sync::Lazy;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
///
/// Used by tests to override the default `env::args()` collection.
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        // Fall back to env::args if the mutex is poisoned
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// =============================================================================

/// Webserver / connection lifecycle debug mode
pub fn is_debug_webserver_enabled() -> bool {
    has_arg("--debug-webserver") || has_arg("--debug-all")
}

/// Hub membership and fan-out debug mode
pub fn is_debug_hub_enabled() -> bool {
    has_arg("--debug-hub") || has_arg("--debug-all")
}

/// Sync protocol dispatch debug mode
pub fn is_debug_sync_enabled() -> bool {
    has_arg("--debug-sync") || has_arg("--debug-all")
}

/// Database operations debug mode
pub fn is_debug_database_enabled() -> bool {
    has_arg("--debug-database") || has_arg("--debug-all")
}

// =============================================================================
// STARTUP OPTIONS
// =============================================================================

/// Override for the config file path (`--config <path>`)
pub fn get_config_path_override() -> Option<String> {
    get_arg_value("--config")
}

/// Override for the webserver port (`--port <port>`)
pub fn get_port_override() -> Option<u16> {
    get_arg_value("--port").and_then(|value| value.parse().ok())
}

pub mod patterns {
    use super::has_arg;

    /// Whether the user asked for usage information
    pub fn is_help_requested() -> bool {
        has_arg("--help") || has_arg("-h")
    }
}

/// Print usage information
pub fn print_help() {
    println!("roomsync - collaborative room layout editor server");
    println!();
    println!("USAGE:");
    println!("  roomsync [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  --config <path>      Config file path (default: data/config.toml)");
    println!("  --port <port>        Override the configured webserver port");
    println!("  --quiet              Only show warnings and errors");
    println!("  --debug-<module>     Enable debug logging for a module");
    println!("                       (system, config, database, webserver, hub, sync)");
    println!("  --debug-all          Enable debug logging everywhere");
    println!("  -h, --help           Show this help text");
}

/// Print which debug modes are active at startup
pub fn print_debug_info() {
    let active: Vec<&str> = [
        ("--debug-webserver", is_debug_webserver_enabled()),
        ("--debug-hub", is_debug_hub_enabled()),
        ("--debug-sync", is_debug_sync_enabled()),
        ("--debug-database", is_debug_database_enabled()),
    ]
    .iter()
    .filter(|(_, enabled)| *enabled)
    .map(|(flag, _)| *flag)
    .collect();

    if !active.is_empty() {
        println!("Debug modes: {}", active.join(" "));
    }
}
