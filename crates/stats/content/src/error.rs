//! Errors raised while loading static definitions.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A single entry is unusable. Loaders skip it and keep going.
    #[error("invalid definition for '{entry}': {reason}")]
    ConfigInvalid { entry: String, reason: String },

    #[error("failed to read definitions file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document as a whole is not valid TOML.
    #[error("failed to parse definitions document: {reason}")]
    Parse { reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            entry: entry.into(),
            reason: reason.into(),
        }
    }
}

pub type LoadResult<T> = std::result::Result<T, ConfigError>;
