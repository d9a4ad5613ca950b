//! Core data model for per-account game statistics.
//!
//! This crate defines the types every other layer agrees on:
//! - [`MetricDefinition`] / [`GameDefinition`]: static, read-only definitions
//!   of which metrics a game exposes and where they are collected from
//! - [`CollectedStats`]: insertion-ordered metric values for one account
//! - [`CachedAccountStat`] / [`StatSnapshot`]: the per-game cache contents that
//!   are persisted to durable storage
//! - [`StatMarkup`] and the account views produced by aggregation
//!
//! Nothing here performs I/O. Loading definitions lives in `stats-content`,
//! caching, collection and aggregation live in `stats-runtime`.

pub mod account;
pub mod collected;
pub mod game;
pub mod markup;
pub mod metric;

pub use account::{CachedAccountStat, StatSnapshot};
pub use collected::CollectedStats;
pub use game::{DataSource, GameDefinition, VarDefinition};
pub use markup::{AccountStatsView, GameStatsView, StatMarkup, indicator_markup};
pub use metric::{MetricDefinition, SpecialType};
