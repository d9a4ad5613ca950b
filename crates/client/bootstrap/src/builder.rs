//! Builds the aggregation engine, app-name resolver, and config bundle used by front-ends.
use std::sync::Arc;

use anyhow::{Context, Result};
use stats_content::{ContentFactory, Definitions, DefinitionsLoader};
use stats_runtime::{
    AggregationEngine, AppNameResolver, EngineContext, EventBus, FileStatRepository, Fetcher,
    HttpFetcher, SourceCollector, StatCollector, StatRepository,
};

use crate::config::StatsConfig;

/// Builder that assembles definitions, storage, and collectors for clients.
pub struct EngineBuilder {
    config: StatsConfig,
    repository: Option<Arc<dyn StatRepository>>,
    collector: Option<Arc<dyn StatCollector>>,
    fetcher: Option<Arc<dyn Fetcher>>,
}

impl EngineBuilder {
    pub fn new(config: StatsConfig) -> Self {
        Self {
            config,
            repository: None,
            collector: None,
            fetcher: None,
        }
    }

    /// Provide a custom repository instead of the file store under the data dir.
    pub fn repository(mut self, repository: impl StatRepository + 'static) -> Self {
        self.repository = Some(Arc::new(repository));
        self
    }

    /// Provide a custom collector (e.g., a scripted one for tests).
    pub fn collector(mut self, collector: impl StatCollector + 'static) -> Self {
        self.collector = Some(Arc::new(collector));
        self
    }

    /// Provide a custom fetcher shared by the default collector and the app-name resolver.
    pub fn fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    pub fn build(self) -> Result<EngineSetup> {
        let definitions = load_definitions(&self.config)?;
        for skipped in &definitions.skipped {
            tracing::warn!("Skipped definition entry: {}", skipped);
        }
        tracing::info!(
            "Loaded {} game definitions across {} platforms",
            definitions.store.len(),
            definitions.index.platforms().len()
        );

        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(
                HttpFetcher::new(self.config.http_timeout)
                    .context("Failed to create HTTP client")?,
            ),
        };

        let repository: Arc<dyn StatRepository> = match self.repository {
            Some(repository) => repository,
            None => Arc::new(
                FileStatRepository::new(self.config.stats_dir()).with_context(|| {
                    format!(
                        "Failed to open stat storage at {}",
                        self.config.stats_dir().display()
                    )
                })?,
            ),
        };

        let collector: Arc<dyn StatCollector> = match self.collector {
            Some(collector) => collector,
            None => Arc::new(SourceCollector::new(
                fetcher.clone(),
                self.config.image_dir(),
            )),
        };

        let events = EventBus::new();
        let app_names = AppNameResolver::new(
            fetcher,
            self.config.app_list_url.clone(),
            self.config.app_names_dir(),
        )
        .with_events(events.clone());

        let context = EngineContext::new(
            Arc::new(definitions.store),
            definitions.index,
            repository,
            collector,
        )
        .with_events(events);

        Ok(EngineSetup {
            config: self.config,
            engine: AggregationEngine::new(context),
            app_names: Arc::new(app_names),
            skipped: definitions.skipped.len(),
        })
    }
}

pub struct EngineSetup {
    pub config: StatsConfig,
    pub engine: AggregationEngine,
    pub app_names: Arc<AppNameResolver>,
    /// Number of definition entries dropped while loading.
    pub skipped: usize,
}

/// Explicit path first, then `<data_dir>/game_stats.toml`, then the bundled document.
fn load_definitions(config: &StatsConfig) -> Result<Definitions> {
    if let Some(path) = &config.definitions_path {
        return DefinitionsLoader::load(path)
            .with_context(|| format!("Failed to load definitions from {}", path.display()));
    }

    let factory = ContentFactory::new(config.data_dir());
    if factory.definitions_path().exists() {
        return factory.load_definitions().with_context(|| {
            format!(
                "Failed to load definitions from {}",
                factory.definitions_path().display()
            )
        });
    }

    tracing::debug!("Using bundled definitions");
    ContentFactory::bundled().context("Bundled definitions are invalid")
}
