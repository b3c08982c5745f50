/// Configuration utilities - loading and access helpers
///
/// The configuration is loaded once at startup into a global instance and
/// read everywhere else through `with_config`.
use std::sync::RwLock;

use once_cell::sync::OnceCell;

use super::schemas::Config;

/// Global configuration instance
///
/// This is the single source of truth for all configuration values.
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Load configuration from disk and initialize the global CONFIG
///
/// Should be called once at startup. A missing file is not an error: the
/// schema defaults apply.
pub fn load_config() -> Result<(), String> {
    load_config_from_path(CONFIG_FILE_PATH)
}

/// Load configuration from a specific TOML file path
pub fn load_config_from_path(path: &str) -> Result<(), String> {
    let config = if std::path::Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;

        toml::from_str::<Config>(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))?
    } else {
        eprintln!("⚠️  Config file '{}' not found, using default values", path);
        Config::default()
    };

    set_config(config);
    Ok(())
}

/// Replace the global configuration
///
/// Used by startup and by tests that need non-default values.
pub fn set_config(config: Config) {
    match CONFIG.get() {
        Some(lock) => {
            if let Ok(mut current) = lock.write() {
                *current = config;
            }
        }
        None => {
            let _ = CONFIG.set(RwLock::new(config));
        }
    }
}

/// Execute a function with read access to the configuration
///
/// This is the recommended way to read configuration values. Falls back to
/// defaults when nothing was loaded, so library consumers and tests don't
/// have to bootstrap a file first.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    let lock = CONFIG.get_or_init(|| RwLock::new(Config::default()));
    let config = lock.read().expect("config lock poisoned");
    f(&config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // One test only: these all touch the global CONFIG instance.
    #[test]
    fn test_loading_behavior() {
        load_config_from_path("definitely/not/a/real/path.toml").unwrap();
        assert_eq!(with_config(|cfg| cfg.webserver.port), 8080);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[webserver]\nport = 9999").unwrap();
        load_config_from_path(file.path().to_str().unwrap()).unwrap();
        assert_eq!(with_config(|cfg| cfg.webserver.port), 9999);

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        writeln!(broken, "webserver = 'nope").unwrap();
        assert!(load_config_from_path(broken.path().to_str().unwrap()).is_err());

        set_config(Config::default());
    }
}
