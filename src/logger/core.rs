/// Core logging implementation with automatic filtering
use super::config::{ get_logger_config, is_debug_enabled_for_tag };
use super::levels::LogLevel;
use super::tags::LogTag;

/// Check if a log message should be displayed
///
/// Errors always pass; debug requires the matching `--debug-<module>`
/// flag; everything else is gated by the minimum level threshold.
pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    if level == LogLevel::Error {
        return true;
    }

    if level == LogLevel::Debug {
        return is_debug_enabled_for_tag(tag);
    }

    level <= get_logger_config().min_level
}

/// Filter, then hand off to formatting and output
pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }
    super::format::format_and_log(tag, level.as_str(), message);
}
