//! Concurrent per-account collection and spawned refreshes.

use std::collections::HashMap;
use std::sync::Arc;

use stats_core::{CollectedStats, GameDefinition};
use tokio::task::{self, JoinHandle, JoinSet};

use crate::api::{CollectError, Result, StatsError};
use crate::cache::StatCache;
use crate::collector::{CollectRequest, StatCollector};
use crate::engine::RefreshReport;

type Collected = (String, std::result::Result<CollectedStats, CollectError>);

/// One collection task per account, all running concurrently.
///
/// Accounts are marked in flight until released, or until the batch is
/// dropped when the owning future is cancelled mid-way. Accounts another batch
/// is already collecting are left to that batch.
pub(crate) struct CollectionBatch {
    cache: Arc<StatCache>,
    /// Accounts this batch marked in flight, by collecting task.
    owned: HashMap<task::Id, String>,
    busy: Vec<String>,
    tasks: JoinSet<Collected>,
}

impl CollectionBatch {
    pub(crate) fn start(
        cache: Arc<StatCache>,
        collector: Arc<dyn StatCollector>,
        platform: &str,
        accounts: Vec<String>,
    ) -> Self {
        let game: Arc<GameDefinition> = Arc::clone(cache.game());
        let mut tasks = JoinSet::new();
        let mut owned = HashMap::with_capacity(accounts.len());
        let mut busy = Vec::new();

        for account_id in accounts {
            if !cache.begin_collection(&account_id) {
                tracing::debug!(
                    "'{}' of {} is already being collected",
                    game.name,
                    account_id
                );
                busy.push(account_id);
                continue;
            }

            let request = CollectRequest::new(account_id.clone(), platform)
                .with_vars(cache.account_vars(&account_id).unwrap_or_default());
            let collector = Arc::clone(&collector);
            let game = Arc::clone(&game);

            let handle = tasks.spawn(async move {
                let result = collector.collect(&game, &request).await;
                (request.account_id, result)
            });
            owned.insert(handle.id(), account_id);
        }

        Self {
            cache,
            owned,
            busy,
            tasks,
        }
    }

    /// Accounts skipped because another collection of them was running.
    pub(crate) fn busy(&self) -> &[String] {
        &self.busy
    }

    /// Next finished collection, in completion order.
    ///
    /// A task that panicked yields its account with
    /// [`CollectError::Interrupted`]. The account stays in flight until
    /// [`release`](Self::release) is called for it.
    pub(crate) async fn next(&mut self) -> Option<Collected> {
        match self.tasks.join_next().await? {
            Ok(collected) => Some(collected),
            Err(err) => {
                let account_id = self.owned.get(&err.id()).cloned().unwrap_or_default();
                tracing::warn!(
                    "Collection of '{}' for {} did not finish: {}",
                    self.cache.game().name,
                    account_id,
                    err
                );
                Some((
                    account_id,
                    Err(CollectError::Interrupted {
                        reason: err.to_string(),
                    }),
                ))
            }
        }
    }

    /// Ends the in-flight mark of a handled account.
    pub(crate) fn release(&mut self, account_id: &str) {
        let before = self.owned.len();
        self.owned.retain(|_, owned| owned != account_id);
        if self.owned.len() != before {
            self.cache.end_collection(account_id);
        }
    }
}

impl Drop for CollectionBatch {
    fn drop(&mut self) {
        for account_id in self.owned.values() {
            self.cache.end_collection(account_id);
        }
    }
}

/// Handle to a refresh running in the background.
pub struct RefreshTask {
    game: String,
    handle: JoinHandle<Result<RefreshReport>>,
}

impl RefreshTask {
    pub(crate) fn new(game: String, handle: JoinHandle<Result<RefreshReport>>) -> Self {
        Self { game, handle }
    }

    pub fn game(&self) -> &str {
        &self.game
    }

    /// Cancels the refresh. Values merged before cancellation are kept but
    /// not persisted by this refresh.
    pub fn abort(&self) {
        tracing::debug!("Aborting refresh of '{}'", self.game);
        self.handle.abort();
    }

    /// Waits for the refresh and returns its report.
    pub async fn join(self) -> Result<RefreshReport> {
        self.handle.await.map_err(StatsError::WorkerJoin)?
    }
}
