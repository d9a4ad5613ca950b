//! Platform-wide aggregation over the per-game stat caches.
//!
//! [`AggregationEngine`] keeps one [`StatCache`] per game compatible with the
//! active platform and answers the cross-game questions: which games have
//! data, what an account's stats look like for display, and what the whole
//! platform looks like as a flat table. Collection results are merged here,
//! by the engine, never by the tasks that fetched them.

mod export;
mod report;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use stats_content::{MetricDefinitionStore, PlatformCompatibilityIndex};
use stats_core::{
    AccountStatsView, CachedAccountStat, GameStatsView, StatMarkup, indicator_markup,
};
use tokio::sync::broadcast;

use crate::api::{Result, StatsError};
use crate::cache::StatCache;
use crate::collector::StatCollector;
use crate::events::{EventBus, StatsEvent, Topic};
use crate::repository::{StatRepository, file_safe};
use crate::workers::{CollectionBatch, RefreshTask};

pub use export::{DEFAULT_SEPARATOR, FlatTable, GameExport, sanitize};
pub use report::RefreshReport;

/// Everything the engine needs, handed over once at construction.
pub struct EngineContext {
    pub store: Arc<MetricDefinitionStore>,
    pub index: PlatformCompatibilityIndex,
    pub repository: Arc<dyn StatRepository>,
    pub collector: Arc<dyn StatCollector>,
    pub events: EventBus,
}

impl EngineContext {
    pub fn new(
        store: Arc<MetricDefinitionStore>,
        index: PlatformCompatibilityIndex,
        repository: Arc<dyn StatRepository>,
        collector: Arc<dyn StatCollector>,
    ) -> Self {
        Self {
            store,
            index,
            repository,
            collector,
            events: EventBus::new(),
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }
}

#[derive(Default)]
struct Registry {
    platform: Option<String>,
    /// Games of the active platform that have a cache, in platform order.
    games: Vec<String>,
    caches: HashMap<String, Arc<StatCache>>,
}

struct EngineInner {
    store: Arc<MetricDefinitionStore>,
    repository: Arc<dyn StatRepository>,
    collector: Arc<dyn StatCollector>,
    events: EventBus,
    index: RwLock<PlatformCompatibilityIndex>,
    registry: RwLock<Registry>,
    exporting: AtomicBool,
}

/// Cross-game view of the cached stats of the active platform.
///
/// Cheap to clone; clones share the same caches.
#[derive(Clone)]
pub struct AggregationEngine {
    inner: Arc<EngineInner>,
}

impl AggregationEngine {
    pub fn new(context: EngineContext) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store: context.store,
                repository: context.repository,
                collector: context.collector,
                events: context.events,
                index: RwLock::new(context.index),
                registry: RwLock::new(Registry::default()),
                exporting: AtomicBool::new(false),
            }),
        }
    }

    // Registry and index writes replace whole values, so a poisoned lock
    // still guards consistent data.
    fn registry(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn registry_mut(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Every platform in the compatibility table, sorted.
    pub fn platforms(&self) -> Vec<String> {
        self.inner
            .index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .platforms()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Games `platform` supports, in platform order, without activating it.
    pub fn compatible_games(&self, platform: &str) -> Vec<String> {
        self.inner
            .index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .compatible_games(platform)
            .to_vec()
    }

    /// Whether `platform` is known and lists at least one game.
    pub fn has_any_games(&self, platform: &str) -> bool {
        self.inner
            .index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .has_any_games(platform)
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<StatsEvent> {
        self.inner.events.subscribe(topic)
    }

    pub fn store(&self) -> &MetricDefinitionStore {
        &self.inner.store
    }

    pub fn active_platform(&self) -> Option<String> {
        self.registry().platform.clone()
    }

    /// Makes `platform` active and returns its games in platform order.
    ///
    /// Caches of games that stay compatible are reused; caches of games that
    /// are not are persisted if needed and dropped. Selecting the current
    /// platform again only re-validates. An unknown platform simply has no
    /// games.
    pub fn set_active_platform(&self, platform: &str) -> Vec<String> {
        let (compatible, known) = {
            let index = self
                .inner
                .index
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            (
                index.compatible_games(platform).to_vec(),
                index.contains_platform(platform),
            )
        };
        if !known {
            tracing::debug!("Platform '{}' is not in the compatibility table", platform);
        }

        let (games, dropped, changed) = {
            let mut registry = self.registry_mut();
            let changed = registry.platform.as_deref() != Some(platform);

            let stale: Vec<String> = registry
                .caches
                .keys()
                .filter(|game| !compatible.contains(*game))
                .cloned()
                .collect();
            let dropped: Vec<Arc<StatCache>> = stale
                .iter()
                .filter_map(|game| registry.caches.remove(game))
                .collect();

            let mut games = Vec::with_capacity(compatible.len());
            for name in compatible {
                if !registry.caches.contains_key(&name) {
                    let Some(definition) = self.inner.store.game(&name) else {
                        tracing::debug!("No definition for '{}' on {}", name, platform);
                        continue;
                    };
                    let cache = StatCache::new(
                        Arc::clone(definition),
                        Arc::clone(&self.inner.repository),
                    );
                    registry.caches.insert(name.clone(), Arc::new(cache));
                }
                games.push(name);
            }

            registry.platform = Some(platform.to_string());
            registry.games = games.clone();
            (games, dropped, changed)
        };

        for cache in dropped {
            // Failures are logged and published by persist_cache.
            let _ = self.persist_cache(&cache);
        }
        for (name, cache) in self.caches_in_order() {
            if let Err(err) = cache.ensure_loaded() {
                tracing::warn!("Could not load cached stats for '{}': {}", name, err);
            }
        }

        if changed {
            tracing::info!("Active platform is now {} ({} games)", platform, games.len());
            self.inner.events.publish(StatsEvent::PlatformChanged {
                platform: platform.to_string(),
                games: games.clone(),
            });
        }
        games
    }

    /// Replaces the whole compatibility table and re-selects the active platform.
    pub fn reload_index(&self, index: PlatformCompatibilityIndex) {
        self.inner
            .index
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(index);

        if let Some(platform) = self.active_platform() {
            self.set_active_platform(&platform);
        }
    }

    fn caches_in_order(&self) -> Vec<(String, Arc<StatCache>)> {
        let registry = self.registry();
        registry
            .games
            .iter()
            .filter_map(|game| {
                registry
                    .caches
                    .get(game)
                    .map(|cache| (game.clone(), Arc::clone(cache)))
            })
            .collect()
    }

    /// Cache of a game of the active platform.
    pub fn cache(&self, game: &str) -> Option<Arc<StatCache>> {
        self.registry().caches.get(game).cloned()
    }

    /// Cache of an active game, loaded from storage before anything changes it.
    fn require_cache(&self, game: &str) -> Result<Arc<StatCache>> {
        let cache = self
            .cache(game)
            .ok_or_else(|| StatsError::unknown_game(game))?;
        cache
            .ensure_loaded()
            .map_err(|err| StatsError::load(game, err))?;
        Ok(cache)
    }

    /// Games of the active platform; empty when none is active.
    pub fn available_games(&self) -> Vec<String> {
        self.registry().games.clone()
    }

    /// Games of the active platform with at least one collected account.
    pub fn enabled_games(&self) -> Vec<String> {
        self.caches_in_order()
            .into_iter()
            .filter(|(_, cache)| cache.has_any_data())
            .map(|(game, _)| game)
            .collect()
    }

    /// Visible stats of one account across the active platform's games.
    ///
    /// Hidden metrics are skipped, as are games where nothing is visible.
    pub fn stats_markup_for_account(&self, account_id: &str) -> AccountStatsView {
        let games = self
            .caches_in_order()
            .into_iter()
            .filter_map(|(name, cache)| {
                let stat = cache.get(account_id)?;
                let definition = cache.game();

                let stats: Vec<(String, StatMarkup)> = stat
                    .collected
                    .iter()
                    .filter(|(key, _)| !stat.is_hidden(key))
                    .map(|(key, value)| {
                        let markup = StatMarkup {
                            value: value.to_string(),
                            indicator: indicator_markup(
                                definition.metric(key),
                                definition.indicator(),
                            ),
                        };
                        (key.to_string(), markup)
                    })
                    .collect();

                (!stats.is_empty()).then_some(GameStatsView { game: name, stats })
            })
            .collect();

        AccountStatsView {
            account_id: account_id.to_string(),
            games,
        }
    }

    pub fn user_game_stat(&self, game: &str, account_id: &str) -> Option<CachedAccountStat> {
        self.cache(game)?.get(account_id)
    }

    /// `(metric key, toggle text)` pairs of a game, in definition order.
    pub fn all_metrics(&self, game: &str) -> Result<Vec<(String, String)>> {
        self.inner
            .store
            .game(game)
            .map(|definition| definition.toggle_texts())
            .ok_or_else(|| StatsError::unknown_game(game))
    }

    pub fn game_name_from_id(&self, unique_id: &str) -> Option<String> {
        self.inner
            .store
            .game_by_unique_id(unique_id)
            .map(|game| game.name.clone())
    }

    pub fn game_id_from_name(&self, name: &str) -> Option<String> {
        let store = &self.inner.store;
        store
            .canonical_name(name)
            .and_then(|name| store.game(name))
            .map(|game| game.unique_id.clone())
    }

    pub fn icon_for(&self, game: &str, metric: &str) -> Option<String> {
        self.inner
            .store
            .game(game)?
            .metric(metric)?
            .icon()
            .map(str::to_string)
    }

    pub fn hide_metric(&self, game: &str, account_id: &str, metric: &str) -> Result<bool> {
        let cache = self.require_cache(game)?;
        let changed = cache.hide_metric(account_id, metric);
        if changed {
            self.persist_cache(&cache)?;
        }
        Ok(changed)
    }

    pub fn unhide_metric(&self, game: &str, account_id: &str, metric: &str) -> Result<bool> {
        let cache = self.require_cache(game)?;
        let changed = cache.unhide_metric(account_id, metric);
        if changed {
            self.persist_cache(&cache)?;
        }
        Ok(changed)
    }

    /// Collects every account known to `game` and persists once at the end.
    ///
    /// Failed accounts keep their previous stats. Failures are reported in the
    /// returned [`RefreshReport`] rather than as an error.
    pub async fn refresh_all(&self, game: &str, platform: &str) -> Result<RefreshReport> {
        let cache = self.require_cache(game)?;
        let accounts = cache.account_ids();
        Ok(self.run_refresh(cache, platform, accounts).await)
    }

    /// Runs [`AggregationEngine::refresh_all`] as a background task.
    pub fn spawn_refresh(&self, game: &str, platform: &str) -> RefreshTask {
        let engine = self.clone();
        let (game, platform) = (game.to_string(), platform.to_string());
        let task_game = game.clone();

        let handle = tokio::spawn(async move { engine.refresh_all(&task_game, &platform).await });
        RefreshTask::new(game, handle)
    }

    /// Adds an account to a game and runs its first collection.
    pub async fn enable_game_for_account(
        &self,
        game: &str,
        account_id: &str,
        vars: BTreeMap<String, String>,
    ) -> Result<RefreshReport> {
        let platform = self.active_platform().ok_or(StatsError::NoActivePlatform)?;
        let cache = self.require_cache(game)?;

        if cache.register_account(account_id, vars) {
            tracing::info!("Enabled '{}' for account {}", game, account_id);
        }
        Ok(self
            .run_refresh(cache, &platform, vec![account_id.to_string()])
            .await)
    }

    /// Forgets an account for a game. Returns whether it was known.
    pub fn disable_game_for_account(&self, game: &str, account_id: &str) -> Result<bool> {
        let cache = self.require_cache(game)?;
        if cache.remove_account(account_id).is_none() {
            return Ok(false);
        }
        tracing::info!("Disabled '{}' for account {}", game, account_id);
        self.persist_cache(&cache)?;
        Ok(true)
    }

    async fn run_refresh(
        &self,
        cache: Arc<StatCache>,
        platform: &str,
        accounts: Vec<String>,
    ) -> RefreshReport {
        let game = cache.game().name.clone();
        let mut report = RefreshReport::new(game.clone());

        let mut batch = CollectionBatch::start(
            Arc::clone(&cache),
            Arc::clone(&self.inner.collector),
            platform,
            accounts,
        );
        report.skipped = batch.busy().to_vec();
        while let Some((account_id, result)) = batch.next().await {
            match result {
                Ok(collected) => {
                    cache.record_collection(&account_id, collected);
                    batch.release(&account_id);
                    report.refreshed.push(account_id);
                }
                Err(err) => {
                    tracing::warn!(
                        "Keeping previous stats of {} for '{}': {}",
                        account_id,
                        game,
                        err
                    );
                    batch.release(&account_id);
                    report.failed.push((account_id, err));
                }
            }
        }
        drop(batch);

        report.persist_error = self.persist_cache(&cache).err();

        tracing::info!(
            "Refreshed '{}': {} updated, {} failed",
            game,
            report.refreshed.len(),
            report.failed.len()
        );
        self.inner.events.publish(StatsEvent::RefreshCompleted {
            game,
            refreshed: report.refreshed.len(),
            failed: report.failed.len(),
        });
        report
    }

    fn persist_cache(&self, cache: &StatCache) -> Result<()> {
        let game = &cache.game().name;
        cache.persist().map_err(|err| {
            tracing::warn!("Failed to persist stats for '{}': {}", game, err);
            self.inner.events.publish(StatsEvent::PersistFailed {
                target: game.clone(),
                error: err.to_string(),
            });
            StatsError::persistence(game.clone(), err)
        })
    }

    /// Persists every changed cache of the active platform.
    ///
    /// All caches are attempted; the first failure is returned.
    pub fn persist_all(&self) -> Result<()> {
        let mut first_error = None;
        for (_, cache) in self.caches_in_order() {
            if let Err(err) = self.persist_cache(&cache) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Flat table of every cached stat of `platform`.
    ///
    /// Games of the active platform are read from their live caches; other
    /// games are read from storage without being registered.
    pub fn export_flat_table(&self, platform: &str, separator: &str) -> FlatTable {
        let exports: Vec<GameExport> = self
            .compatible_games(platform)
            .iter()
            .filter_map(|name| {
                let cache = match self.cache(name) {
                    Some(cache) => cache,
                    None => {
                        let definition = self.inner.store.game(name)?;
                        let cache = StatCache::new(
                            Arc::clone(definition),
                            Arc::clone(&self.inner.repository),
                        );
                        if let Err(err) = cache.ensure_loaded() {
                            tracing::warn!("Exporting '{}' without stored stats: {}", name, err);
                        }
                        Arc::new(cache)
                    }
                };
                Some(GameExport {
                    game: Arc::clone(cache.game()),
                    stats: cache.stats_with_data(),
                })
            })
            .collect();

        FlatTable::build(&exports, separator)
    }

    /// Writes the flat table of `platform` to `<dir>/<platform>.csv`.
    ///
    /// Only one export runs at a time; a second one fails with
    /// [`StatsError::ExportInProgress`].
    pub async fn export_to_file(
        &self,
        platform: &str,
        separator: &str,
        dir: &Path,
    ) -> Result<PathBuf> {
        let _guard = ExportGuard::acquire(&self.inner.exporting)?;

        let table = self.export_flat_table(platform, separator);
        let path = dir.join(format!("{}.csv", file_safe(platform)));

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| StatsError::Export {
                path: dir.to_path_buf(),
                source,
            })?;
        tokio::fs::write(&path, table.render())
            .await
            .map_err(|source| StatsError::Export {
                path: path.clone(),
                source,
            })?;

        tracing::info!(
            "Exported {} accounts of {} to {}",
            table.rows().len(),
            platform,
            path.display()
        );
        self.inner.events.publish(StatsEvent::ExportWritten {
            platform: platform.to_string(),
            path: path.clone(),
        });
        Ok(path)
    }
}

struct ExportGuard<'a>(&'a AtomicBool);

impl<'a> ExportGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| StatsError::ExportInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
