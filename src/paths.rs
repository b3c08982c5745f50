/// Data and log directory resolution
///
/// Everything the server writes lives under `data/` and `logs/` relative
/// to the working directory. Directories are created before the logger
/// initializes so the log file always has a home.
use std::path::PathBuf;

/// Directory for the database and config file
pub fn get_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Directory for log files
pub fn get_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

/// Path of the server log file
pub fn get_log_file_path() -> PathBuf {
    get_logs_dir().join("roomsync.log")
}

/// Create all required directories
pub fn ensure_all_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_data_dir())?;
    std::fs::create_dir_all(get_logs_dir())?;
    Ok(())
}
