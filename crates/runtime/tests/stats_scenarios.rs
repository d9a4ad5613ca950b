use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use stats_content::DefinitionsLoader;
use stats_core::{CachedAccountStat, CollectedStats, GameDefinition, StatSnapshot};
use stats_runtime::{
    AggregationEngine, CollectError, CollectRequest, EngineContext, FileStatRepository,
    InMemoryStatRepository, StatCollector, StatRepository, StatsError, StatsEvent, Topic,
};
use tempfile::TempDir;

const DEFINITIONS: &str = r#"
[platforms]
Steam = ["CS:GO", "TF2"]
Epic = ["Rocket League"]

[games."CS:GO"]
unique_id = "csgo"
indicator = "CS"
source = { kind = "web", url = "https://csgo.invalid/{AccountId}" }
metrics = [
    { key = "Kills", pointer = "/kills" },
    { key = "Deaths", pointer = "/deaths" },
]

[games.TF2]
unique_id = "tf2"
indicator = "TF"
source = { kind = "web", url = "https://tf2.invalid/{AccountId}" }
metrics = [{ key = "Wins", pointer = "/wins" }]

[games."Rocket League"]
unique_id = "rl"
source = { kind = "web", url = "https://rl.invalid/{AccountId}" }
metrics = [{ key = "Rank", pointer = "/rank" }]
"#;

#[derive(Clone)]
enum Script {
    Stats(Vec<(&'static str, &'static str)>),
    Unavailable,
    Hang,
    Crash,
}

/// Collector whose answer per (game, account) is set by the test.
#[derive(Default)]
struct ScriptedCollector {
    scripts: Mutex<HashMap<(String, String), Script>>,
}

impl ScriptedCollector {
    fn set(&self, game: &str, account: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert((game.to_string(), account.to_string()), script);
    }
}

#[async_trait]
impl StatCollector for ScriptedCollector {
    async fn collect(
        &self,
        game: &GameDefinition,
        request: &CollectRequest,
    ) -> Result<CollectedStats, CollectError> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&(game.name.clone(), request.account_id.clone()))
            .cloned();

        match script {
            Some(Script::Stats(pairs)) => Ok(pairs.into_iter().collect()),
            Some(Script::Unavailable) => Err(CollectError::SourceUnavailable {
                location: game.source.template().to_string(),
                reason: "connection refused".into(),
            }),
            Some(Script::Hang) => std::future::pending().await,
            Some(Script::Crash) => panic!("collector crashed for {}", request.account_id),
            None => Err(CollectError::ParseFailure {
                location: game.source.template().to_string(),
                reason: "no script".into(),
            }),
        }
    }
}

fn engine(
    repository: Arc<dyn StatRepository>,
    collector: Arc<ScriptedCollector>,
) -> AggregationEngine {
    let definitions =
        DefinitionsLoader::from_toml_str(DEFINITIONS).expect("definitions should parse");
    assert!(definitions.skipped.is_empty());

    AggregationEngine::new(EngineContext::new(
        Arc::new(definitions.store),
        definitions.index,
        repository,
        collector,
    ))
}

fn in_memory(collector: &Arc<ScriptedCollector>) -> AggregationEngine {
    engine(Arc::new(InMemoryStatRepository::new()), collector.clone())
}

/// Steam has CS:GO and TF2; A1 only has CS:GO data.
#[tokio::test]
async fn test_steam_scenario_views() {
    let collector = Arc::new(ScriptedCollector::default());
    collector.set("CS:GO", "A1", Script::Stats(vec![("Kills", "10")]));
    let engine = in_memory(&collector);

    assert_eq!(engine.set_active_platform("Steam"), vec!["CS:GO", "TF2"]);
    assert!(engine.enabled_games().is_empty());

    let report = engine
        .enable_game_for_account("CS:GO", "A1", BTreeMap::new())
        .await
        .expect("enable should succeed");
    assert!(report.is_success());

    assert_eq!(engine.enabled_games(), vec!["CS:GO"]);

    let view = engine.stats_markup_for_account("A1");
    assert_eq!(view.game_names(), vec!["CS:GO"]);
    let kills = view.game("CS:GO").unwrap().get("Kills").unwrap();
    assert_eq!(kills.value, "10");
    assert_eq!(kills.indicator, "<sup>CS</sup>");
}

/// A failed refresh leaves the previously cached values untouched.
#[tokio::test]
async fn test_source_unavailable_keeps_stale_values() {
    let collector = Arc::new(ScriptedCollector::default());
    collector.set("TF2", "A2", Script::Stats(vec![("Wins", "5")]));
    let engine = in_memory(&collector);
    engine.set_active_platform("Steam");
    engine
        .enable_game_for_account("TF2", "A2", BTreeMap::new())
        .await
        .expect("enable should succeed");

    collector.set("TF2", "A2", Script::Unavailable);
    let report = engine
        .refresh_all("TF2", "Steam")
        .await
        .expect("refresh should run");

    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].1.is_source_unavailable());
    assert!(report.notification().is_some());

    let stat = engine.user_game_stat("TF2", "A2").expect("stale stats kept");
    assert_eq!(
        stat.collected,
        [("Wins", "5")].into_iter().collect::<CollectedStats>()
    );
}

/// A refresh replaces the whole map; keys from the previous collection go away.
#[tokio::test]
async fn test_refresh_replaces_previous_collection() {
    let collector = Arc::new(ScriptedCollector::default());
    collector.set(
        "CS:GO",
        "A1",
        Script::Stats(vec![("Kills", "10"), ("Deaths", "3")]),
    );
    let engine = in_memory(&collector);
    engine.set_active_platform("Steam");
    engine
        .enable_game_for_account("CS:GO", "A1", BTreeMap::new())
        .await
        .unwrap();

    collector.set("CS:GO", "A1", Script::Stats(vec![("Kills", "11")]));
    let report = engine.refresh_all("CS:GO", "Steam").await.unwrap();
    assert_eq!(report.refreshed, vec!["A1"]);

    let stat = engine.user_game_stat("CS:GO", "A1").unwrap();
    assert_eq!(
        stat.collected,
        [("Kills", "11")].into_iter().collect::<CollectedStats>()
    );
}

/// Accounts whose first collection failed are absent and do not enable a game.
#[tokio::test]
async fn test_never_collected_accounts_are_absent() {
    let collector = Arc::new(ScriptedCollector::default());
    collector.set("TF2", "A3", Script::Unavailable);
    let engine = in_memory(&collector);
    engine.set_active_platform("Steam");

    engine
        .enable_game_for_account("TF2", "A3", BTreeMap::new())
        .await
        .unwrap();

    assert!(engine.user_game_stat("TF2", "A3").is_none());
    assert!(engine.user_game_stat("CS:GO", "A3").is_none());
    assert!(engine.enabled_games().is_empty());
    assert!(engine.stats_markup_for_account("A3").is_empty());
}

/// Stats persisted by one engine are read back identically by a fresh one.
#[tokio::test]
async fn test_persisted_stats_round_trip() {
    let dir = TempDir::new().unwrap();
    let collector = Arc::new(ScriptedCollector::default());
    collector.set(
        "CS:GO",
        "A1",
        Script::Stats(vec![("Kills", "10"), ("Deaths", "Ünïcødé ✓")]),
    );
    collector.set("CS:GO", "B2", Script::Stats(vec![("Kills", "7")]));

    let first = engine(
        Arc::new(FileStatRepository::new(dir.path()).unwrap()),
        collector.clone(),
    );
    first.set_active_platform("Steam");
    let vars = BTreeMap::from([("Region".to_string(), "eu".to_string())]);
    first
        .enable_game_for_account("CS:GO", "A1", vars)
        .await
        .unwrap();
    first
        .enable_game_for_account("CS:GO", "B2", BTreeMap::new())
        .await
        .unwrap();
    first.hide_metric("CS:GO", "A1", "Deaths").unwrap();

    let second = engine(
        Arc::new(FileStatRepository::new(dir.path()).unwrap()),
        collector,
    );
    second.set_active_platform("Steam");

    for account in ["A1", "B2"] {
        assert_eq!(
            second.user_game_stat("CS:GO", account),
            first.user_game_stat("CS:GO", account),
            "{account}"
        );
    }
    assert_eq!(
        second.cache("CS:GO").unwrap().account_vars("A1").unwrap()["Region"],
        "eu"
    );
}

/// Hidden metrics never show up in the account view.
#[tokio::test]
async fn test_hidden_metrics_are_filtered() {
    let collector = Arc::new(ScriptedCollector::default());
    collector.set(
        "CS:GO",
        "A1",
        Script::Stats(vec![("Kills", "10"), ("Deaths", "3")]),
    );
    let engine = in_memory(&collector);
    engine.set_active_platform("Steam");
    engine
        .enable_game_for_account("CS:GO", "A1", BTreeMap::new())
        .await
        .unwrap();

    assert!(engine.hide_metric("CS:GO", "A1", "Deaths").unwrap());
    let view = engine.stats_markup_for_account("A1");
    let csgo = view.game("CS:GO").unwrap();
    assert!(csgo.get("Deaths").is_none());
    assert!(csgo.get("Kills").is_some());

    assert!(engine.hide_metric("CS:GO", "A1", "Kills").unwrap());
    assert!(engine.stats_markup_for_account("A1").is_empty());

    assert!(engine.unhide_metric("CS:GO", "A1", "Deaths").unwrap());
    let view = engine.stats_markup_for_account("A1");
    assert!(view.game("CS:GO").unwrap().get("Deaths").is_some());
}

/// Values containing the separator keep the column count of the header.
#[tokio::test]
async fn test_export_sanitizes_separator() {
    let dir = TempDir::new().unwrap();
    let collector = Arc::new(ScriptedCollector::default());
    collector.set("CS:GO", "A1", Script::Stats(vec![("Kills", "1;000")]));
    collector.set("TF2", "B2", Script::Stats(vec![("Wins", "5")]));
    let engine = in_memory(&collector);
    let mut storage = engine.subscribe(Topic::Storage);
    engine.set_active_platform("Steam");
    for (game, account) in [("CS:GO", "A1"), ("TF2", "B2")] {
        engine
            .enable_game_for_account(game, account, BTreeMap::new())
            .await
            .unwrap();
    }

    let path = engine
        .export_to_file("Steam", ";", dir.path())
        .await
        .expect("export should succeed");
    assert_eq!(path, dir.path().join("Steam.csv"));
    assert!(matches!(
        storage.recv().await.unwrap(),
        StatsEvent::ExportWritten { .. }
    ));

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "SEP=;",
            "Account name:;CS:GO:Kills;TF2:Wins",
            "A1;1 000;",
            "B2;;5",
        ]
    );
    let columns = lines[1].split(';').count();
    assert!(lines[2..].iter().all(|l| l.split(';').count() == columns));
}

/// Persist failures are reported once and never roll back memory.
#[tokio::test]
async fn test_persist_failure_is_reported_not_fatal() {
    let repository = Arc::new(InMemoryStatRepository::new());
    let collector = Arc::new(ScriptedCollector::default());
    collector.set("TF2", "A1", Script::Stats(vec![("Wins", "9")]));
    let engine = engine(repository.clone(), collector);
    let mut storage = engine.subscribe(Topic::Storage);
    engine.set_active_platform("Steam");

    repository.set_fail_saves(true);
    let report = engine
        .enable_game_for_account("TF2", "A1", BTreeMap::new())
        .await
        .unwrap();

    assert!(report.failed.is_empty());
    assert!(matches!(
        report.persist_error,
        Some(StatsError::PersistenceFailed { .. })
    ));
    assert_eq!(
        report.notification().as_deref(),
        Some("Stats for TF2 could not be saved")
    );
    assert!(matches!(
        storage.recv().await.unwrap(),
        StatsEvent::PersistFailed { .. }
    ));
    assert!(engine.user_game_stat("TF2", "A1").is_some());

    repository.set_fail_saves(false);
    engine.persist_all().expect("retry should persist");
    assert!(repository.load("tf2").unwrap().is_some());
}

/// Switching away from a platform drops its caches and keeps the data durable.
#[tokio::test]
async fn test_platform_switch_drops_incompatible_caches() {
    let collector = Arc::new(ScriptedCollector::default());
    collector.set("TF2", "A1", Script::Stats(vec![("Wins", "1")]));
    let engine = in_memory(&collector);
    let mut session = engine.subscribe(Topic::Session);

    engine.set_active_platform("Steam");
    engine
        .enable_game_for_account("TF2", "A1", BTreeMap::new())
        .await
        .unwrap();

    assert_eq!(engine.set_active_platform("Epic"), vec!["Rocket League"]);
    assert!(engine.cache("TF2").is_none());
    assert!(engine.enabled_games().is_empty());
    assert!(matches!(
        engine.refresh_all("TF2", "Epic").await,
        Err(StatsError::UnknownGame { .. })
    ));

    engine.set_active_platform("Steam");
    assert_eq!(engine.enabled_games(), vec!["TF2"]);

    let mut platforms = Vec::new();
    while let Ok(StatsEvent::PlatformChanged { platform, .. }) = session.try_recv() {
        platforms.push(platform);
    }
    assert_eq!(platforms, vec!["Steam", "Epic", "Steam"]);
}

/// A spawned refresh can be joined, or aborted without leaving accounts in flight.
#[tokio::test]
async fn test_spawned_refresh_join_and_abort() {
    let collector = Arc::new(ScriptedCollector::default());
    collector.set("TF2", "A1", Script::Stats(vec![("Wins", "1")]));
    let engine = in_memory(&collector);
    engine.set_active_platform("Steam");
    engine
        .enable_game_for_account("TF2", "A1", BTreeMap::new())
        .await
        .unwrap();

    collector.set("TF2", "A1", Script::Stats(vec![("Wins", "2")]));
    let report = engine
        .spawn_refresh("TF2", "Steam")
        .join()
        .await
        .expect("refresh should finish");
    assert_eq!(report.refreshed, vec!["A1"]);

    collector.set("TF2", "A1", Script::Hang);
    let cache = engine.cache("TF2").unwrap();
    let task = engine.spawn_refresh("TF2", "Steam");
    for _ in 0..100 {
        if cache.is_collecting("A1") {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(cache.is_collecting("A1"));

    task.abort();
    assert!(matches!(task.join().await, Err(StatsError::WorkerJoin(_))));
    assert!(!cache.is_collecting("A1"));
    assert_eq!(
        cache.get("A1").unwrap().collected,
        [("Wins", "2")].into_iter().collect::<CollectedStats>()
    );
}

/// An unreadable record blocks edits instead of being overwritten by them.
#[tokio::test]
async fn test_unreadable_record_is_never_overwritten() {
    let mut stored = CachedAccountStat::new("A1");
    stored.collected = [("Wins", "5")].into_iter().collect();
    let mut snapshot = StatSnapshot::default();
    snapshot.insert(stored);
    let repository = Arc::new(InMemoryStatRepository::with_snapshot("tf2", snapshot));

    let collector = Arc::new(ScriptedCollector::default());
    collector.set("TF2", "A2", Script::Stats(vec![("Wins", "2")]));
    let engine = engine(repository.clone(), collector);

    repository.set_fail_loads(true);
    engine.set_active_platform("Steam");
    assert!(matches!(
        engine
            .enable_game_for_account("TF2", "A2", BTreeMap::new())
            .await,
        Err(StatsError::LoadFailed { .. })
    ));
    assert!(matches!(
        engine.hide_metric("TF2", "A1", "Wins"),
        Err(StatsError::LoadFailed { .. })
    ));

    repository.set_fail_loads(false);
    let report = engine
        .enable_game_for_account("TF2", "A2", BTreeMap::new())
        .await
        .expect("load is retried");
    assert_eq!(report.refreshed, vec!["A2"]);

    let stored = repository.load("tf2").unwrap().expect("record kept");
    assert_eq!(stored.get("A1").unwrap().collected.get("Wins"), Some("5"));
    assert_eq!(stored.get("A2").unwrap().collected.get("Wins"), Some("2"));
}

/// A separator that also appears in the header labels does not shift columns.
#[tokio::test]
async fn test_export_with_colon_separator() {
    let collector = Arc::new(ScriptedCollector::default());
    collector.set(
        "CS:GO",
        "A1",
        Script::Stats(vec![("Kills", "10"), ("Deaths", "1:2")]),
    );
    let engine = in_memory(&collector);
    engine.set_active_platform("Steam");
    engine
        .enable_game_for_account("CS:GO", "A1", BTreeMap::new())
        .await
        .unwrap();

    let table = engine.export_flat_table("Steam", ":");
    let lines = table.lines();
    assert_eq!(lines[0], "SEP=:");
    let columns = lines[1].split(':').count();
    assert_eq!(columns, 3);
    assert!(lines[2..].iter().all(|l| l.split(':').count() == columns));
    assert_eq!(lines[2], "A1:10:1 2");
}

/// A second refresh leaves accounts another refresh is still collecting alone.
#[tokio::test]
async fn test_overlapping_refreshes_keep_each_others_accounts() {
    let collector = Arc::new(ScriptedCollector::default());
    collector.set("TF2", "A1", Script::Stats(vec![("Wins", "1")]));
    collector.set("TF2", "B2", Script::Stats(vec![("Wins", "4")]));
    let engine = in_memory(&collector);
    engine.set_active_platform("Steam");
    for account in ["A1", "B2"] {
        engine
            .enable_game_for_account("TF2", account, BTreeMap::new())
            .await
            .unwrap();
    }

    collector.set("TF2", "A1", Script::Hang);
    let cache = engine.cache("TF2").unwrap();
    let first = engine.spawn_refresh("TF2", "Steam");
    for _ in 0..100 {
        if cache.is_collecting("A1") && !cache.is_collecting("B2") {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(cache.is_collecting("A1"));
    assert!(!cache.is_collecting("B2"));

    let second = engine.refresh_all("TF2", "Steam").await.unwrap();
    assert_eq!(second.skipped, vec!["A1"]);
    assert_eq!(second.refreshed, vec!["B2"]);
    assert!(cache.is_collecting("A1"));

    first.abort();
    assert!(first.join().await.is_err());
    assert!(!cache.is_collecting("A1"));
}

/// A collector that panics fails its account and releases it.
#[tokio::test]
async fn test_crashed_collection_is_reported_as_failure() {
    let collector = Arc::new(ScriptedCollector::default());
    collector.set("TF2", "A1", Script::Stats(vec![("Wins", "1")]));
    let engine = in_memory(&collector);
    engine.set_active_platform("Steam");
    engine
        .enable_game_for_account("TF2", "A1", BTreeMap::new())
        .await
        .unwrap();

    collector.set("TF2", "A1", Script::Crash);
    let report = engine.refresh_all("TF2", "Steam").await.unwrap();
    assert!(report.refreshed.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "A1");
    assert!(matches!(
        report.failed[0].1,
        CollectError::Interrupted { .. }
    ));
    assert!(!engine.cache("TF2").unwrap().is_collecting("A1"));
    assert_eq!(
        engine.user_game_stat("TF2", "A1").unwrap().collected.get("Wins"),
        Some("1")
    );
}
