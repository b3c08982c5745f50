/// Log tags, one per subsystem

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Database,
    Webserver,
    Hub,
    Sync,
}

impl LogTag {
    /// Plain uppercase name used in file output and console formatting
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Database => "DATABASE",
            LogTag::Webserver => "WEBSERVER",
            LogTag::Hub => "HUB",
            LogTag::Sync => "SYNC",
        }
    }

    /// Key matched against `--debug-<key>` command-line flags
    pub fn to_debug_key(&self) -> &'static str {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Database => "database",
            LogTag::Webserver => "webserver",
            LogTag::Hub => "hub",
            LogTag::Sync => "sync",
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
