//! Display-ready views produced by aggregation.

use serde::Serialize;

use crate::metric::{MetricDefinition, SpecialType};

/// A stat value paired with the markup shown next to it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatMarkup {
    pub value: String,
    pub indicator: String,
}

/// Resolves the indicator for a metric.
///
/// Precedence: the metric's own icon, then the game badge wrapped in `<sup>`,
/// then nothing. Image metrics never fall back to the game badge. A metric
/// without a definition is treated as a plain text metric.
pub fn indicator_markup(metric: Option<&MetricDefinition>, game_indicator: Option<&str>) -> String {
    if let Some(icon) = metric.and_then(MetricDefinition::icon) {
        return icon.to_string();
    }

    let special_type = metric.map(|m| m.special_type).unwrap_or_default();
    match game_indicator {
        Some(badge) if !badge.is_empty() && special_type != SpecialType::ImageDownload => {
            format!("<sup>{badge}</sup>")
        }
        _ => String::new(),
    }
}

/// Visible stats of one game for one account, in collection order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GameStatsView {
    pub game: String,
    pub stats: Vec<(String, StatMarkup)>,
}

impl GameStatsView {
    pub fn get(&self, metric: &str) -> Option<&StatMarkup> {
        self.stats
            .iter()
            .find(|(key, _)| key == metric)
            .map(|(_, markup)| markup)
    }
}

/// All visible stats of one account across the active platform's games.
///
/// Games appear in platform compatibility order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AccountStatsView {
    pub account_id: String,
    pub games: Vec<GameStatsView>,
}

impl AccountStatsView {
    pub fn game(&self, name: &str) -> Option<&GameStatsView> {
        self.games.iter().find(|g| g.game == name)
    }

    pub fn game_names(&self) -> Vec<&str> {
        self.games.iter().map(|g| g.game.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
