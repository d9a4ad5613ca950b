//! Shared bootstrap utilities for client front-ends.
//!
//! Provides configuration loading, platform directories, and engine setup
//! that can be reused by the CLI or any other front-end crate.
pub mod builder;
pub mod config;
pub mod dirs;

pub use builder::{EngineBuilder, EngineSetup};
pub use config::StatsConfig;
