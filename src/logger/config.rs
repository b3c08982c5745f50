/// Logger configuration and filtering rules
///
/// Built once from command-line arguments at startup; readable from any
/// thread afterwards.
use std::collections::HashSet;
use std::sync::RwLock;

use once_cell::sync::Lazy;

use super::tags::LogTag;
use crate::arguments;

use super::levels::LogLevel;

/// Logger behavior switches
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Highest level displayed (Error always passes)
    pub min_level: LogLevel,

    /// Tags with `--debug-<key>` enabled
    pub debug_tags: HashSet<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self { min_level: LogLevel::Info, debug_tags: HashSet::new() }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Build the logger configuration from command-line arguments
///
/// `--debug-all` turns every tag on; `--quiet` drops everything below
/// warnings.
pub fn init_from_args() {
    let mut config = LoggerConfig::default();

    if arguments::has_arg("--quiet") {
        config.min_level = LogLevel::Warning;
    }

    for key in ["system", "config", "database", "webserver", "hub", "sync"] {
        if arguments::has_arg(&format!("--debug-{}", key)) || arguments::has_arg("--debug-all") {
            config.debug_tags.insert(key.to_string());
        }
    }

    set_logger_config(config);
}

/// Get a copy of the current logger configuration
pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().map(|cfg| cfg.clone()).unwrap_or_default()
}

/// Replace the logger configuration
pub fn set_logger_config(config: LoggerConfig) {
    if let Ok(mut current) = LOGGER_CONFIG.write() {
        *current = config;
    }
}

/// Whether debug output is enabled for a tag
pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG
        .read()
        .map(|cfg| cfg.debug_tags.contains(tag.to_debug_key()))
        .unwrap_or(false)
}
