//! Statistics cache and aggregation runtime.
//!
//! This crate wires the static definitions from `stats-content` to durable
//! per-game caches, external collectors, and the platform-wide aggregation
//! consumers interact with. Consumers build an [`EngineContext`] once and
//! drive everything through [`AggregationEngine`].
//!
//! Modules are organized by responsibility:
//! - [`engine`] hosts the aggregation engine, export and refresh reports
//! - [`cache`] holds the per-game [`StatCache`]
//! - [`collector`] fetches fresh values from web and save-file sources
//! - [`repository`] persists caches between sessions
//! - [`events`] provides topic-based event bus for UI notifications
//! - [`app_names`] resolves numeric app ids to display names
//! - `workers` keeps background collection tasks internal to the crate
pub mod api;
pub mod app_names;
pub mod cache;
pub mod collector;
pub mod engine;
pub mod events;
pub mod repository;

mod workers;

pub use api::{CollectError, ConfigError, RepositoryError, Result, StatsError};
pub use app_names::{AppEntry, AppList, AppListDocument, AppNameResolver, display_name};
pub use cache::StatCache;
pub use collector::{
    CollectRequest, Fetcher, HttpFetcher, SourceCollector, StatCollector, render_template,
    render_url,
};
pub use engine::{
    AggregationEngine, DEFAULT_SEPARATOR, EngineContext, FlatTable, GameExport, RefreshReport,
};
pub use events::{EventBus, StatsEvent, Topic};
pub use repository::{FileStatRepository, InMemoryStatRepository, StatRepository};
pub use workers::RefreshTask;
