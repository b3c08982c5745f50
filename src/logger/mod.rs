//! Structured logging for roomsync
//!
//! Tagged, level-filtered logging with colored console output and a file
//! mirror. Debug output is opt-in per module via `--debug-<module>` flags,
//! e.g. `--debug-hub` enables `logger::debug(LogTag::Hub, ...)`.
//!
//! Call `logger::init()` once at startup (after the log directory exists),
//! then use the level functions anywhere:
//!
//! ```ignore
//! logger::info(LogTag::System, "starting up");
//! logger::debug(LogTag::Sync, "frame contents: ..."); // only with --debug-sync
//! ```

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{ get_logger_config, init_from_args, set_logger_config, LoggerConfig };
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Parses command-line arguments for debug flags and opens the log file.
pub fn init() {
    config::init_from_args();
    file::init_file_logging();
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (important issues)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (detailed diagnostics)
///
/// Only shown when the matching `--debug-<module>` flag is provided.
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Force flush pending log writes, used during shutdown
pub fn flush() {
    file::flush_file_logging();
}
