//! Collection of fresh statistic values from external sources.
//!
//! A [`StatCollector`] turns one (game, account) pair into a
//! [`CollectedStats`] map. Collectors hold only read-only state, so many
//! collections can run concurrently; merging results into a cache is left to
//! the caller.

mod fetch;
mod source;
mod template;

use std::collections::BTreeMap;

use async_trait::async_trait;
use stats_core::{CollectedStats, GameDefinition};

use crate::api::CollectError;

pub use fetch::{Fetcher, HttpFetcher};
pub use source::SourceCollector;
pub use template::{render_template, render_url};

/// Everything a collector needs to know about the account being collected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectRequest {
    pub account_id: String,
    pub vars: BTreeMap<String, String>,
    /// Platform the collection was started from, available as `{Platform}`.
    pub platform: String,
}

impl CollectRequest {
    pub fn new(account_id: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            vars: BTreeMap::new(),
            platform: platform.into(),
        }
    }

    pub fn with_vars(mut self, vars: BTreeMap<String, String>) -> Self {
        self.vars = vars;
        self
    }
}

#[async_trait]
pub trait StatCollector: Send + Sync {
    /// Fetch fresh values of every metric `game` defines for one account.
    async fn collect(
        &self,
        game: &GameDefinition,
        request: &CollectRequest,
    ) -> Result<CollectedStats, CollectError>;
}
