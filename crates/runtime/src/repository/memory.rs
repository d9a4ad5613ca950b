//! In-memory StatRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use stats_core::StatSnapshot;

use crate::repository::{RepositoryError, Result, StatRepository};

/// In-memory implementation of StatRepository.
///
/// Stores snapshots keyed by game id. Can be told to fail saves or loads,
/// which lets tests exercise storage-failure handling.
#[derive(Default)]
pub struct InMemoryStatRepository {
    snapshots: RwLock<HashMap<String, StatSnapshot>>,
    fail_saves: RwLock<bool>,
    fail_loads: RwLock<bool>,
}

impl InMemoryStatRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a stored snapshot for one game.
    pub fn with_snapshot(game_id: impl Into<String>, snapshot: StatSnapshot) -> Self {
        let repo = Self::new();
        if let Ok(mut snapshots) = repo.snapshots.write() {
            snapshots.insert(game_id.into(), snapshot);
        }
        repo
    }

    /// Make every following `save` fail with an I/O error until reset.
    pub fn set_fail_saves(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_saves.write() {
            *flag = fail;
        }
    }

    /// Make every following `load` fail with an I/O error until reset.
    pub fn set_fail_loads(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_loads.write() {
            *flag = fail;
        }
    }
}

fn check(flag: &RwLock<bool>) -> Result<()> {
    if *flag.read().map_err(|_| RepositoryError::LockPoisoned)? {
        return Err(RepositoryError::Io(std::io::Error::other(
            "storage unavailable",
        )));
    }
    Ok(())
}

impl StatRepository for InMemoryStatRepository {
    fn save(&self, game_id: &str, snapshot: &StatSnapshot) -> Result<()> {
        check(&self.fail_saves)?;

        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.insert(game_id.to_string(), snapshot.clone());
        Ok(())
    }

    fn load(&self, game_id: &str) -> Result<Option<StatSnapshot>> {
        check(&self.fail_loads)?;

        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(snapshots.get(game_id).cloned())
    }

    fn delete(&self, game_id: &str) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.remove(game_id);
        Ok(())
    }
}
