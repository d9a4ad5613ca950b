//! Event payloads published by the engine and its workers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::bus::Topic;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatsEvent {
    /// The active platform changed; `games` are its compatible games in order.
    PlatformChanged { platform: String, games: Vec<String> },

    /// A refresh of one game finished.
    RefreshCompleted {
        game: String,
        refreshed: usize,
        failed: usize,
    },

    /// Writing a game's cache to durable storage failed.
    PersistFailed { target: String, error: String },

    ExportWritten { platform: String, path: PathBuf },

    /// The full app-name list was downloaded and stored.
    AppNamesUpdated { count: usize },
}

impl StatsEvent {
    pub fn topic(&self) -> Topic {
        match self {
            StatsEvent::PlatformChanged { .. } => Topic::Session,
            StatsEvent::RefreshCompleted { .. } => Topic::Refresh,
            StatsEvent::PersistFailed { .. } | StatsEvent::ExportWritten { .. } => Topic::Storage,
            StatsEvent::AppNamesUpdated { .. } => Topic::AppNames,
        }
    }
}
