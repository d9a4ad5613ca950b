//! Platform to game compatibility index.

use std::collections::HashMap;

use crate::error::ConfigError;
use crate::loaders::MetricDefinitionStore;

/// Maps a platform name to the ordered list of games it supports.
///
/// Order is kept exactly as declared; views and exports rely on it for
/// deterministic output. Reloading replaces the whole table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformCompatibilityIndex {
    platforms: HashMap<String, Vec<String>>,
}

impl PlatformCompatibilityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a platform entry.
    pub fn with_platform<I, S>(mut self, platform: impl Into<String>, games: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms
            .insert(platform.into(), games.into_iter().map(Into::into).collect());
        self
    }

    /// Builds the index from the `platforms` table of a definitions document.
    ///
    /// Games that are not present in `store` are dropped with a warning, as
    /// are duplicate entries within one platform.
    pub fn from_table(
        platforms: &toml::Table,
        store: &MetricDefinitionStore,
    ) -> (Self, Vec<ConfigError>) {
        let mut index = Self::new();
        let mut skipped = Vec::new();

        for (platform, value) in platforms {
            let Some(entries) = value.as_array() else {
                let err = ConfigError::invalid(platform, "expected a list of game names");
                tracing::warn!("Skipping platform: {}", err);
                skipped.push(err);
                continue;
            };

            let mut games: Vec<String> = Vec::with_capacity(entries.len());
            for entry in entries {
                let Some(game) = entry.as_str() else {
                    let err = ConfigError::invalid(platform, format!("non-string entry {entry}"));
                    tracing::warn!("Ignoring platform entry: {}", err);
                    skipped.push(err);
                    continue;
                };
                if !store.contains(game) {
                    let err =
                        ConfigError::invalid(platform, format!("unknown or invalid game '{game}'"));
                    tracing::warn!("Ignoring platform entry: {}", err);
                    skipped.push(err);
                    continue;
                }
                if games.iter().any(|g| g == game) {
                    tracing::debug!("Duplicate game '{}' for platform '{}'", game, platform);
                    continue;
                }
                games.push(game.to_string());
            }

            index.platforms.insert(platform.clone(), games);
        }

        (index, skipped)
    }

    /// Games compatible with `platform`, in declared order.
    ///
    /// Unknown platforms yield an empty slice.
    pub fn compatible_games(&self, platform: &str) -> &[String] {
        self.platforms
            .get(platform)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn has_any_games(&self, platform: &str) -> bool {
        !self.compatible_games(platform).is_empty()
    }

    pub fn contains_platform(&self, platform: &str) -> bool {
        self.platforms.contains_key(platform)
    }

    /// Platform names in sorted order.
    pub fn platforms(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.platforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Replaces the whole table with a freshly loaded one.
    pub fn replace(&mut self, other: PlatformCompatibilityIndex) {
        *self = other;
    }
}
