//! Game definitions and their data sources.

use serde::{Deserialize, Serialize};

use crate::metric::MetricDefinition;

/// Where fresh values for a game are collected from.
///
/// Both variants carry a template: `{AccountId}`, `{Platform}` and every
/// account variable (`{Name}`) are substituted before use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    /// JSON document fetched over HTTP.
    Web { url: String },

    /// JSON save file on the local disk.
    SaveFile { path: String },
}

impl DataSource {
    pub fn template(&self) -> &str {
        match self {
            Self::Web { url } => url,
            Self::SaveFile { path } => path,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Web { .. } => "web",
            Self::SaveFile { .. } => "save file",
        }
    }
}

/// A per-account variable a game needs before it can be collected
/// (e.g. a username or region).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarDefinition {
    pub name: String,
    #[serde(default)]
    pub prompt: String,
}

/// Static definition of a statistics-tracked game.
///
/// Loaded once at startup and read-only afterwards. Metrics keep their
/// declared order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameDefinition {
    pub name: String,
    /// Short code, also used to name the game's persisted cache.
    pub unique_id: String,
    /// Badge shown next to metrics that have no icon of their own.
    pub indicator: Option<String>,
    pub vars: Vec<VarDefinition>,
    pub source: DataSource,
    metrics: Vec<MetricDefinition>,
}

impl GameDefinition {
    pub fn new(name: impl Into<String>, unique_id: impl Into<String>, source: DataSource) -> Self {
        Self {
            name: name.into(),
            unique_id: unique_id.into(),
            indicator: None,
            vars: Vec::new(),
            source,
            metrics: Vec::new(),
        }
    }

    pub fn with_indicator(mut self, indicator: impl Into<String>) -> Self {
        self.indicator = Some(indicator.into());
        self
    }

    pub fn with_var(mut self, name: impl Into<String>, prompt: impl Into<String>) -> Self {
        self.vars.push(VarDefinition {
            name: name.into(),
            prompt: prompt.into(),
        });
        self
    }

    /// Adds a metric, replacing any earlier metric with the same key.
    pub fn with_metric(mut self, metric: MetricDefinition) -> Self {
        self.insert_metric(metric);
        self
    }

    pub fn insert_metric(&mut self, metric: MetricDefinition) {
        match self.metrics.iter_mut().find(|m| m.key == metric.key) {
            Some(existing) => *existing = metric,
            None => self.metrics.push(metric),
        }
    }

    pub fn metric(&self, key: &str) -> Option<&MetricDefinition> {
        self.metrics.iter().find(|m| m.key == key)
    }

    pub fn has_metric(&self, key: &str) -> bool {
        self.metric(key).is_some()
    }

    pub fn metrics(&self) -> &[MetricDefinition] {
        &self.metrics
    }

    /// Game badge, if one is set and non-empty.
    pub fn indicator(&self) -> Option<&str> {
        self.indicator.as_deref().filter(|i| !i.is_empty())
    }

    /// Metric keys with their selector labels, in declared order.
    pub fn toggle_texts(&self) -> Vec<(String, String)> {
        self.metrics
            .iter()
            .map(|m| (m.key.clone(), m.toggle_text.clone()))
            .collect()
    }
}
