//! Static statistics content and its loaders.
//!
//! This crate turns the definitions document (TOML) into the two read-only
//! structures the runtime consumes:
//! - [`MetricDefinitionStore`]: game name to [`stats_core::GameDefinition`]
//! - [`PlatformCompatibilityIndex`]: platform name to its ordered game list
//!
//! Loading is tolerant: a malformed game entry is logged and skipped, only a
//! document that cannot be parsed at all fails.

pub mod error;
pub mod loaders;

pub use error::{ConfigError, LoadResult};
pub use loaders::{
    ContentFactory, Definitions, DefinitionsLoader, MetricDefinitionStore,
    PlatformCompatibilityIndex,
};
