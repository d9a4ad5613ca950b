//! Cached per-account statistics and the persisted per-game snapshot.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::collected::CollectedStats;

/// Statistics cached for one account of one game.
///
/// The account id is the key of the owning [`StatSnapshot`] and is not repeated
/// in the serialized record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAccountStat {
    #[serde(skip)]
    pub account_id: String,

    /// Per-account variables used to resolve source templates.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,

    #[serde(default)]
    pub collected: CollectedStats,

    #[serde(default)]
    pub hidden_metrics: BTreeSet<String>,

    /// Time of the last successful collection; `None` until the first one.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl CachedAccountStat {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            vars: BTreeMap::new(),
            collected: CollectedStats::new(),
            hidden_metrics: BTreeSet::new(),
            last_updated: None,
        }
    }

    pub fn with_vars(mut self, vars: BTreeMap<String, String>) -> Self {
        self.vars = vars;
        self
    }

    pub fn is_hidden(&self, metric: &str) -> bool {
        self.hidden_metrics.contains(metric)
    }

    pub fn has_data(&self) -> bool {
        !self.collected.is_empty()
    }
}

/// All cached accounts of one game, keyed by account id.
///
/// This is the unit written to durable storage, one per game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, CachedAccountStat>")]
pub struct StatSnapshot {
    accounts: BTreeMap<String, CachedAccountStat>,
}

impl StatSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, account_id: &str) -> Option<&CachedAccountStat> {
        self.accounts.get(account_id)
    }

    pub fn get_mut(&mut self, account_id: &str) -> Option<&mut CachedAccountStat> {
        self.accounts.get_mut(account_id)
    }

    /// Inserts an account record, keyed by its `account_id`.
    pub fn insert(&mut self, stat: CachedAccountStat) -> Option<CachedAccountStat> {
        self.accounts.insert(stat.account_id.clone(), stat)
    }

    pub fn remove(&mut self, account_id: &str) -> Option<CachedAccountStat> {
        self.accounts.remove(account_id)
    }

    pub fn contains(&self, account_id: &str) -> bool {
        self.accounts.contains_key(account_id)
    }

    pub fn account_ids(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &CachedAccountStat> {
        self.accounts.values()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl From<BTreeMap<String, CachedAccountStat>> for StatSnapshot {
    fn from(mut accounts: BTreeMap<String, CachedAccountStat>) -> Self {
        for (id, stat) in accounts.iter_mut() {
            stat.account_id.clone_from(id);
        }
        Self { accounts }
    }
}

impl Serialize for StatSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.accounts.serialize(serializer)
    }
}
