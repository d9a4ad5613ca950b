//! Per-game cache of collected account statistics.
//!
//! A [`StatCache`] owns the in-memory [`StatSnapshot`] of one game and knows
//! how to load and persist it through a [`StatRepository`]. Every mutation
//! takes the write lock, so merges into one game are serialized while reads
//! stay concurrent.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use stats_core::{CachedAccountStat, CollectedStats, GameDefinition, StatSnapshot};

use crate::repository::{RepositoryError, StatRepository};

#[derive(Debug, Default)]
struct CacheState {
    snapshot: StatSnapshot,
    /// Accounts changed since the last successful persist.
    dirty: BTreeSet<String>,
    /// Accounts with a collection currently running.
    in_flight: HashSet<String>,
    loaded: bool,
}

/// In-memory and persisted stats of every account for one game.
pub struct StatCache {
    game: Arc<GameDefinition>,
    repository: Arc<dyn StatRepository>,
    state: RwLock<CacheState>,
    /// Held from snapshot to write, so an older snapshot never lands last.
    persisting: Mutex<()>,
}

impl StatCache {
    pub fn new(game: Arc<GameDefinition>, repository: Arc<dyn StatRepository>) -> Self {
        Self {
            game,
            repository,
            state: RwLock::new(CacheState::default()),
            persisting: Mutex::new(()),
        }
    }

    pub fn game(&self) -> &Arc<GameDefinition> {
        &self.game
    }

    // A panic while holding the lock cannot leave a half-written account: every
    // mutation replaces whole values, so the state is usable after poisoning.
    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads the persisted snapshot once. Later calls are no-ops.
    ///
    /// A missing record yields an empty cache. Accounts already present in
    /// memory win over their stored copies.
    pub fn ensure_loaded(&self) -> Result<(), RepositoryError> {
        if self.is_loaded() {
            return Ok(());
        }

        let stored = self.repository.load(&self.game.unique_id)?;

        let mut state = self.write();
        if state.loaded {
            return Ok(());
        }
        if let Some(stored) = stored {
            for stat in stored.accounts() {
                if !state.snapshot.contains(&stat.account_id) {
                    state.snapshot.insert(stat.clone());
                }
            }
        }
        state.loaded = true;

        tracing::debug!(
            "Stat cache for '{}' loaded with {} accounts",
            self.game.name,
            state.snapshot.len()
        );
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.read().loaded
    }

    /// Cached stats of one account.
    ///
    /// An account whose `collected` map is empty is reported as absent unless
    /// a collection for it is running.
    pub fn get(&self, account_id: &str) -> Option<CachedAccountStat> {
        let state = self.read();
        let stat = state.snapshot.get(account_id)?;
        if stat.has_data() || state.in_flight.contains(account_id) {
            Some(stat.clone())
        } else {
            None
        }
    }

    /// Replaces the whole `collected` map of an account, creating the account
    /// if needed.
    pub fn record_collection(&self, account_id: &str, collected: CollectedStats) {
        let mut state = self.write();
        match state.snapshot.get_mut(account_id) {
            Some(stat) => {
                stat.collected = collected;
                stat.last_updated = Some(Utc::now());
            }
            None => {
                let mut stat = CachedAccountStat::new(account_id);
                stat.collected = collected;
                stat.last_updated = Some(Utc::now());
                state.snapshot.insert(stat);
            }
        }
        state.dirty.insert(account_id.to_string());
    }

    /// Writes the snapshot if any account changed since the last persist.
    ///
    /// The stored record is merged first; while it cannot be read nothing is
    /// written, so accounts only present on disk are never overwritten. A
    /// snapshot left without accounts deletes the record. On failure the
    /// in-memory state is left untouched and the changed accounts stay dirty
    /// for the next attempt.
    pub fn persist(&self) -> Result<(), RepositoryError> {
        let _persisting = self
            .persisting
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if !self.is_dirty() {
            return Ok(());
        }
        self.ensure_loaded()?;

        let (snapshot, dirty) = {
            let mut state = self.write();
            if state.dirty.is_empty() {
                return Ok(());
            }
            (state.snapshot.clone(), std::mem::take(&mut state.dirty))
        };

        let written = if snapshot.is_empty() {
            self.repository.delete(&self.game.unique_id)
        } else {
            self.repository.save(&self.game.unique_id, &snapshot)
        };

        match written {
            Ok(()) => {
                tracing::debug!(
                    "Persisted {} changed accounts for '{}'",
                    dirty.len(),
                    self.game.name
                );
                Ok(())
            }
            Err(err) => {
                self.write().dirty.extend(dirty);
                Err(err)
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        !self.read().dirty.is_empty()
    }

    /// Hides a metric for an account. Returns whether anything changed.
    ///
    /// Unknown accounts and metric keys the game does not define are ignored.
    pub fn hide_metric(&self, account_id: &str, metric: &str) -> bool {
        if !self.game.has_metric(metric) {
            tracing::debug!(
                "Ignoring hide of undefined metric '{}' for '{}'",
                metric,
                self.game.name
            );
            return false;
        }
        self.update_account(account_id, |stat| {
            stat.hidden_metrics.insert(metric.to_string())
        })
    }

    /// Shows a previously hidden metric again. Returns whether anything changed.
    pub fn unhide_metric(&self, account_id: &str, metric: &str) -> bool {
        self.update_account(account_id, |stat| stat.hidden_metrics.remove(metric))
    }

    fn update_account(
        &self,
        account_id: &str,
        update: impl FnOnce(&mut CachedAccountStat) -> bool,
    ) -> bool {
        let mut state = self.write();
        let Some(stat) = state.snapshot.get_mut(account_id) else {
            return false;
        };
        let changed = update(stat);
        if changed {
            state.dirty.insert(account_id.to_string());
        }
        changed
    }

    /// Registers an account with the variables its source needs.
    ///
    /// Existing accounts keep their stats and only get their variables
    /// replaced. Returns `true` when the account is new.
    pub fn register_account(&self, account_id: &str, vars: BTreeMap<String, String>) -> bool {
        let mut state = self.write();
        let created = match state.snapshot.get_mut(account_id) {
            Some(stat) => {
                stat.vars = vars;
                false
            }
            None => {
                state
                    .snapshot
                    .insert(CachedAccountStat::new(account_id).with_vars(vars));
                true
            }
        };
        state.dirty.insert(account_id.to_string());
        created
    }

    /// Forgets an account for this game.
    pub fn remove_account(&self, account_id: &str) -> Option<CachedAccountStat> {
        let mut state = self.write();
        let removed = state.snapshot.remove(account_id)?;
        state.in_flight.remove(account_id);
        state.dirty.insert(account_id.to_string());
        Some(removed)
    }

    /// Marks a collection as running. Returns `false` if one already was.
    pub fn begin_collection(&self, account_id: &str) -> bool {
        self.write().in_flight.insert(account_id.to_string())
    }

    pub fn end_collection(&self, account_id: &str) {
        self.write().in_flight.remove(account_id);
    }

    pub fn is_collecting(&self, account_id: &str) -> bool {
        self.read().in_flight.contains(account_id)
    }

    /// Every account known to this game, including ones never collected.
    pub fn account_ids(&self) -> Vec<String> {
        self.read()
            .snapshot
            .account_ids()
            .map(str::to_string)
            .collect()
    }

    /// Variables of a known account.
    pub fn account_vars(&self, account_id: &str) -> Option<BTreeMap<String, String>> {
        self.read()
            .snapshot
            .get(account_id)
            .map(|stat| stat.vars.clone())
    }

    /// Whether at least one account has non-empty collected data.
    pub fn has_any_data(&self) -> bool {
        self.read().snapshot.accounts().any(CachedAccountStat::has_data)
    }

    /// Every account with collected data, in account id order.
    pub fn stats_with_data(&self) -> Vec<CachedAccountStat> {
        self.read()
            .snapshot
            .accounts()
            .filter(|stat| stat.has_data())
            .cloned()
            .collect()
    }
}
