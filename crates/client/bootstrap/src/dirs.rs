//! Platform-specific directory utilities
//!
//! Provides consistent directory paths across different operating systems,
//! following platform conventions for cache and data directories.

use std::path::PathBuf;

const APP_NAME: &str = "switcher-stats";

/// Get the platform-specific log directory
///
/// Follows platform conventions:
/// - macOS: `~/Library/Caches/switcher-stats/logs`
/// - Linux: `~/.cache/switcher-stats/logs` (or `$XDG_CACHE_HOME/switcher-stats/logs`)
/// - Windows: `%LOCALAPPDATA%\switcher-stats\logs`
/// - Fallback: `/tmp/switcher-stats/logs`
pub fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
        .join("logs")
}

/// Get the platform-specific data directory
///
/// Follows platform conventions:
/// - macOS: `~/Library/Application Support/switcher-stats`
/// - Linux: `~/.local/share/switcher-stats` (or `$XDG_DATA_HOME/switcher-stats`)
/// - Windows: `%APPDATA%\switcher-stats`
/// - Fallback: `./stats_data`
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./stats_data"))
}
