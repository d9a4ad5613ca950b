//! Game and metric definitions loader.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use stats_core::{DataSource, GameDefinition, MetricDefinition, VarDefinition};

use crate::error::ConfigError;

/// Raw shape of a `[games."<name>"]` table.
#[derive(Debug, Deserialize)]
struct GameSpec {
    unique_id: String,
    #[serde(default)]
    indicator: Option<String>,
    #[serde(default)]
    vars: Vec<VarDefinition>,
    source: DataSource,
    #[serde(default)]
    metrics: Vec<MetricDefinition>,
}

impl GameSpec {
    fn into_definition(self, name: &str) -> Result<GameDefinition, ConfigError> {
        if self.unique_id.trim().is_empty() {
            return Err(ConfigError::invalid(name, "missing unique_id"));
        }
        if self.source.template().trim().is_empty() {
            return Err(ConfigError::invalid(name, "source template is empty"));
        }
        if self.metrics.is_empty() {
            return Err(ConfigError::invalid(name, "declares no metrics"));
        }

        let mut game = GameDefinition::new(name, self.unique_id, self.source);
        game.indicator = self.indicator;
        game.vars = self.vars;

        for (index, mut metric) in self.metrics.into_iter().enumerate() {
            if metric.key.trim().is_empty() {
                return Err(ConfigError::invalid(
                    name,
                    format!("metric #{index} has an empty key"),
                ));
            }
            if metric.pointer.trim().is_empty() {
                return Err(ConfigError::invalid(
                    name,
                    format!("metric '{}' has an empty pointer", metric.key),
                ));
            }
            if metric.toggle_text.is_empty() {
                metric.toggle_text.clone_from(&metric.key);
            }
            game.insert_metric(metric);
        }

        Ok(game)
    }
}

/// Read-only mapping of game name to its definition.
///
/// Populated once at startup. Invalid entries found while loading are kept in
/// [`MetricDefinitionStore::skipped`] for reporting.
#[derive(Debug, Default)]
pub struct MetricDefinitionStore {
    games: HashMap<String, Arc<GameDefinition>>,
    skipped: Vec<ConfigError>,
}

impl MetricDefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from already-constructed definitions.
    pub fn from_games(games: impl IntoIterator<Item = GameDefinition>) -> Self {
        let mut store = Self::new();
        for game in games {
            store.games.insert(game.name.clone(), Arc::new(game));
        }
        store
    }

    /// Builds a store from the `games` table of a definitions document.
    ///
    /// Each game is validated on its own; a bad game is logged, recorded and
    /// skipped without affecting the rest.
    pub fn from_table(games: &toml::Table) -> Self {
        let mut store = Self::new();

        for (name, value) in games {
            let definition = value
                .clone()
                .try_into::<GameSpec>()
                .map_err(|e| ConfigError::invalid(name, e.to_string()))
                .and_then(|spec| spec.into_definition(name))
                .and_then(|game| store.check_unique_id(game));

            match definition {
                Ok(game) => {
                    tracing::debug!(
                        "Loaded game '{}' ({}) with {} metrics",
                        game.name,
                        game.unique_id,
                        game.metrics().len()
                    );
                    store.games.insert(name.clone(), Arc::new(game));
                }
                Err(err) => {
                    tracing::warn!("Skipping game definition: {}", err);
                    store.skipped.push(err);
                }
            }
        }

        store
    }

    fn check_unique_id(&self, game: GameDefinition) -> Result<GameDefinition, ConfigError> {
        match self.game_by_unique_id(&game.unique_id) {
            Some(existing) => Err(ConfigError::invalid(
                &game.name,
                format!(
                    "unique_id '{}' already used by '{}'",
                    game.unique_id, existing.name
                ),
            )),
            None => Ok(game),
        }
    }

    pub fn game(&self, name: &str) -> Option<&Arc<GameDefinition>> {
        self.games.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.games.contains_key(name)
    }

    /// Looks a game up by its short unique id, ignoring case.
    pub fn game_by_unique_id(&self, unique_id: &str) -> Option<&Arc<GameDefinition>> {
        self.games
            .values()
            .find(|g| g.unique_id.eq_ignore_ascii_case(unique_id))
    }

    /// Resolves a game name ignoring case, returning the canonical name.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.games
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Game names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.games.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Entries rejected during loading.
    pub fn skipped(&self) -> &[ConfigError] {
        &self.skipped
    }

    pub(crate) fn take_skipped(&mut self) -> Vec<ConfigError> {
        std::mem::take(&mut self.skipped)
    }
}
