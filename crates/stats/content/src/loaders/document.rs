//! Definitions document loader.

use std::path::Path;

use crate::error::{ConfigError, LoadResult};
use crate::loaders::{MetricDefinitionStore, PlatformCompatibilityIndex, read_file};

/// Everything loaded from one definitions document.
#[derive(Debug, Default)]
pub struct Definitions {
    pub store: MetricDefinitionStore,
    pub index: PlatformCompatibilityIndex,
    /// Entries rejected while loading, for reporting.
    pub skipped: Vec<ConfigError>,
}

/// Loader for the statistics definitions document.
///
/// File format:
/// ```toml
/// [platforms]
/// Steam = ["CS:GO", "TF2"]
///
/// [games."CS:GO"]
/// unique_id = "csgo"
/// indicator = "CS"
/// source = { kind = "web", url = "https://example/{AccountId}" }
/// metrics = [{ key = "Kills", pointer = "/stats/kills" }]
/// ```
pub struct DefinitionsLoader;

impl DefinitionsLoader {
    /// Load definitions from a TOML file.
    pub fn load(path: &Path) -> LoadResult<Definitions> {
        let content = read_file(path)?;
        let definitions = Self::from_toml_str(&content)?;

        tracing::info!(
            "Loaded {} game definitions and {} platforms from {} ({} entries skipped)",
            definitions.store.len(),
            definitions.index.platforms().len(),
            path.display(),
            definitions.skipped.len()
        );

        Ok(definitions)
    }

    /// Parse definitions from TOML text.
    ///
    /// Fails only when the document itself is malformed; invalid entries are
    /// skipped and reported in [`Definitions::skipped`].
    pub fn from_toml_str(content: &str) -> LoadResult<Definitions> {
        let document: toml::Table = content.parse().map_err(|e: toml::de::Error| {
            ConfigError::Parse {
                reason: e.to_string(),
            }
        })?;

        let empty = toml::Table::new();
        let games = section(&document, "games")?.unwrap_or(&empty);
        let platforms = section(&document, "platforms")?.unwrap_or(&empty);

        let mut store = MetricDefinitionStore::from_table(games);
        let (index, platform_skips) = PlatformCompatibilityIndex::from_table(platforms, &store);

        let mut skipped = store.take_skipped();
        skipped.extend(platform_skips);

        Ok(Definitions {
            store,
            index,
            skipped,
        })
    }
}

fn section<'a>(document: &'a toml::Table, name: &str) -> LoadResult<Option<&'a toml::Table>> {
    match document.get(name) {
        None => Ok(None),
        Some(value) => value.as_table().map(Some).ok_or_else(|| ConfigError::Parse {
            reason: format!("'{name}' must be a table"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLED: &str = include_str!("../../data/game_stats.toml");

    #[test]
    fn test_bundled_definitions_load_cleanly() {
        let defs = DefinitionsLoader::from_toml_str(BUNDLED).unwrap();
        assert!(defs.skipped.is_empty(), "skipped: {:?}", defs.skipped);
        assert_eq!(
            defs.index.compatible_games("Steam"),
            ["Steam Profile", "CS:GO", "TF2"]
        );
        assert!(!defs.index.has_any_games("Battle.net"));
        assert!(
            defs.store
                .game("Steam Profile")
                .unwrap()
                .metric("Avatar")
                .unwrap()
                .special_type
                .is_image_download()
        );
    }

    #[test]
    fn test_malformed_document_is_config_error() {
        let err = DefinitionsLoader::from_toml_str("[platforms\nSteam = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_games_section_must_be_table() {
        let err = DefinitionsLoader::from_toml_str("games = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_partial_document_keeps_valid_entries() {
        let defs = DefinitionsLoader::from_toml_str(
            r#"
            [platforms]
            Steam = ["Good", "Broken"]

            [games.Good]
            unique_id = "good"
            source = { kind = "web", url = "https://example.invalid/{AccountId}" }
            metrics = [{ key = "Level", pointer = "/level" }]

            [games.Broken]
            source = { kind = "web", url = "https://example.invalid/{AccountId}" }
            metrics = [{ key = "Level", pointer = "/level" }]
            "#,
        )
        .unwrap();

        assert_eq!(defs.index.compatible_games("Steam"), ["Good"]);
        // One for the broken game, one for the dangling platform entry.
        assert_eq!(defs.skipped.len(), 2);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = DefinitionsLoader::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
