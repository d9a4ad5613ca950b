//! Statistics engine configuration structures and loaders.
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use stats_runtime::DEFAULT_SEPARATOR;

use crate::dirs;

pub const DEFAULT_APP_LIST_URL: &str = "https://api.steampowered.com/ISteamApps/GetAppList/v2/";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration required to assemble an aggregation engine.
#[derive(Clone, Debug)]
pub struct StatsConfig {
    /// Explicit definitions document. When unset, `<data_dir>/game_stats.toml`
    /// is used if present, otherwise the bundled definitions.
    pub definitions_path: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
    pub http_timeout: Duration,
    pub app_list_url: String,
    pub export_separator: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self::with_data_dir(dirs::data_dir())
    }
}

impl StatsConfig {
    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            definitions_path: None,
            export_dir: data_dir.join("Exported"),
            data_dir,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            app_list_url: DEFAULT_APP_LIST_URL.to_string(),
            export_separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `STATS_DEFINITIONS` - Definitions document (default: data dir, then bundled)
    /// - `STATS_DATA_DIR` - Durable storage root (default: platform-specific)
    /// - `STATS_EXPORT_DIR` - Export output directory (default: `<data_dir>/Exported`)
    /// - `STATS_HTTP_TIMEOUT_SECS` - HTTP timeout in seconds (default: 15)
    /// - `STATS_APP_LIST_URL` - Remote app list document
    /// - `STATS_EXPORT_SEPARATOR` - Export field separator (default: `,`)
    pub fn from_env() -> Self {
        let mut config = match env::var("STATS_DATA_DIR") {
            Ok(dir) if !dir.is_empty() => Self::with_data_dir(dir),
            _ => Self::default(),
        };

        config.definitions_path = env::var("STATS_DEFINITIONS").ok().map(PathBuf::from);

        if let Ok(dir) = env::var("STATS_EXPORT_DIR") {
            config.export_dir = PathBuf::from(dir);
        }

        if let Some(secs) = read_env::<u64>("STATS_HTTP_TIMEOUT_SECS") {
            config.http_timeout = Duration::from_secs(secs.max(1));
        }

        if let Ok(url) = env::var("STATS_APP_LIST_URL") {
            config.app_list_url = url;
        }

        if let Ok(separator) = env::var("STATS_EXPORT_SEPARATOR")
            && !separator.is_empty()
        {
            config.export_separator = separator;
        }

        config
    }

    pub fn stats_dir(&self) -> PathBuf {
        self.data_dir.join("stats")
    }

    pub fn image_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    pub fn app_names_dir(&self) -> PathBuf {
        self.data_dir.join("apps")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_data_dir() {
        let config = StatsConfig::with_data_dir("/tmp/stats");
        assert_eq!(config.stats_dir(), Path::new("/tmp/stats/stats"));
        assert_eq!(config.image_dir(), Path::new("/tmp/stats/images"));
        assert_eq!(config.export_dir, Path::new("/tmp/stats/Exported"));
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert_eq!(config.export_separator, ",");
        assert!(config.definitions_path.is_none());
    }
}
