//! Public runtime API surface.
//!
//! This module gathers the error types exposed to consumers of the runtime
//! crate so other layers can stay focused on caching, collection, or
//! aggregation.

pub mod errors;

pub use errors::{CollectError, ConfigError, RepositoryError, Result, StatsError};
