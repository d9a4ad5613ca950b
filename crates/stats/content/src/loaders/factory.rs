//! Content factory for loading statistics definitions from a data directory.

use std::path::{Path, PathBuf};

use crate::error::LoadResult;
use crate::loaders::{Definitions, DefinitionsLoader};

/// File name of the definitions document inside the data directory.
pub const DEFINITIONS_FILE: &str = "game_stats.toml";

/// Content factory that loads all statistics definitions from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// └── game_stats.toml
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load game definitions and platform compatibility from `game_stats.toml`.
    pub fn load_definitions(&self) -> LoadResult<Definitions> {
        DefinitionsLoader::load(&self.definitions_path())
    }

    /// Definitions bundled with the crate, used when no data directory is configured.
    pub fn bundled() -> LoadResult<Definitions> {
        DefinitionsLoader::from_toml_str(include_str!("../../data/game_stats.toml"))
    }

    pub fn definitions_path(&self) -> PathBuf {
        self.data_dir.join(DEFINITIONS_FILE)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
