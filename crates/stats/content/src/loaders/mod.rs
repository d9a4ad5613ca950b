//! Content loaders for reading statistics definitions from files.

pub mod definitions;
pub mod document;
pub mod factory;
pub mod platforms;

pub use definitions::MetricDefinitionStore;
pub use document::{Definitions, DefinitionsLoader};
pub use factory::ContentFactory;
pub use platforms::PlatformCompatibilityIndex;

use std::path::Path;

use crate::error::{ConfigError, LoadResult};

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}
