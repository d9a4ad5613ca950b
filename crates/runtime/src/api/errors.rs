//! Unified error types surfaced by the statistics runtime.
//!
//! Collection and persistence failures are recoverable by design of the
//! engine: they are logged, reported once per operation and never abort
//! aggregation across other games.
use std::path::PathBuf;

use thiserror::Error;

pub use crate::repository::RepositoryError;
pub use stats_content::ConfigError;

pub type Result<T> = std::result::Result<T, StatsError>;

/// Failure while collecting fresh values for one account.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Network endpoint or local file could not be reached.
    #[error("source unavailable at {location}: {reason}")]
    SourceUnavailable { location: String, reason: String },

    /// The source answered but its payload could not be understood.
    #[error("failed to parse payload from {location}: {reason}")]
    ParseFailure { location: String, reason: String },

    /// A `{Var}` placeholder in the source template has no value for this account.
    #[error("source template needs variable '{name}'")]
    MissingVariable { name: String },

    /// The collection task panicked or was cancelled before answering.
    #[error("collection did not finish: {reason}")]
    Interrupted { reason: String },
}

impl CollectError {
    pub(crate) fn unavailable(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn parse(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::ParseFailure {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures where the source itself could not be reached.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::MissingVariable { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum StatsError {
    #[error(transparent)]
    ConfigInvalid(#[from] ConfigError),

    #[error("source unavailable at {location}: {reason}")]
    SourceUnavailable { location: String, reason: String },

    #[error("failed to parse payload from {location}: {reason}")]
    ParseFailure { location: String, reason: String },

    /// In-memory state is kept; only the durable copy is behind.
    #[error("failed to persist {target}")]
    PersistenceFailed {
        target: String,
        #[source]
        source: RepositoryError,
    },

    /// The stored record could not be read; nothing is written until it can.
    #[error("failed to load stored stats of {target}")]
    LoadFailed {
        target: String,
        #[source]
        source: RepositoryError,
    },

    #[error("game '{game}' is not loaded for the active platform")]
    UnknownGame { game: String },

    #[error("no active platform selected")]
    NoActivePlatform,

    #[error("an export is already in progress")]
    ExportInProgress,

    #[error("failed to write export to {path}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("background worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

impl From<CollectError> for StatsError {
    fn from(err: CollectError) -> Self {
        match err {
            CollectError::SourceUnavailable { location, reason } => {
                Self::SourceUnavailable { location, reason }
            }
            CollectError::MissingVariable { name } => Self::SourceUnavailable {
                location: format!("{{{name}}}"),
                reason: "variable not set for account".to_string(),
            },
            CollectError::ParseFailure { location, reason } => {
                Self::ParseFailure { location, reason }
            }
            CollectError::Interrupted { reason } => Self::SourceUnavailable {
                location: "collection task".to_string(),
                reason,
            },
        }
    }
}

impl StatsError {
    pub(crate) fn persistence(target: impl Into<String>, source: RepositoryError) -> Self {
        Self::PersistenceFailed {
            target: target.into(),
            source,
        }
    }

    pub(crate) fn load(target: impl Into<String>, source: RepositoryError) -> Self {
        Self::LoadFailed {
            target: target.into(),
            source,
        }
    }

    pub(crate) fn unknown_game(game: impl Into<String>) -> Self {
        Self::UnknownGame { game: game.into() }
    }
}
