use std::path::PathBuf;

/// Resolve the Asset Relay home directory.
///
/// Priority:
/// 1) ASSETRELAY_HOME
/// 2) ~/.assetrelay
/// 3) ./.assetrelay
pub fn relay_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("ASSETRELAY_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .map(|home| home.join(".assetrelay"))
        .unwrap_or_else(|| PathBuf::from(".").join(".assetrelay"))
}

/// Default configuration file: ~/.assetrelay/assetrelay.toml
pub fn default_config_path() -> PathBuf {
    relay_home().join("assetrelay.toml")
}

/// Default ledger file: ~/.assetrelay/ledger.json
pub fn default_ledger_path() -> PathBuf {
    relay_home().join("ledger.json")
}

/// Default logs directory: ~/.assetrelay/logs
pub fn default_logs_dir() -> PathBuf {
    relay_home().join("logs")
}
