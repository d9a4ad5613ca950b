//! Resolution of numeric app ids to display names.
//!
//! The full app list is a large remote JSON document. It is downloaded on
//! demand and kept on disk; a much smaller per-user cache holds only the ids
//! that are actually installed. Every step tolerates a missing or broken
//! source, in which case the id itself is used as the name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::api::{CollectError, Result, StatsError};
use crate::collector::Fetcher;
use crate::events::{EventBus, StatsEvent};
use crate::repository::RepositoryError;

const FULL_LIST_FILE: &str = "SteamApps.json";
const USER_CACHE_FILE: &str = "AppIdsUser.json";

/// Shape of the remote app-list document:
/// `{"applist": {"apps": [{"appid": 10, "name": "Counter-Strike"}]}}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppListDocument {
    pub applist: AppList,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppList {
    #[serde(default)]
    pub apps: Vec<AppEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntry {
    pub appid: u64,
    #[serde(default)]
    pub name: String,
}

impl AppListDocument {
    /// Id to name. The first name wins when an id repeats.
    pub fn names(&self) -> BTreeMap<String, String> {
        let mut names = BTreeMap::new();
        for app in &self.applist.apps {
            names
                .entry(app.appid.to_string())
                .or_insert_with(|| app.name.clone());
        }
        names
    }
}

/// Maps installed app ids to names, backed by the downloaded full list.
pub struct AppNameResolver {
    fetcher: Arc<dyn Fetcher>,
    url: String,
    dir: PathBuf,
    events: Option<EventBus>,
}

impl AppNameResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, url: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            url: url.into(),
            dir: dir.into(),
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    fn full_list_path(&self) -> PathBuf {
        self.dir.join(FULL_LIST_FILE)
    }

    fn user_cache_path(&self) -> PathBuf {
        self.dir.join(USER_CACHE_FILE)
    }

    pub fn has_full_list(&self) -> bool {
        self.full_list_path().exists()
    }

    /// Names for the installed ids.
    ///
    /// Uses the user cache when it covers every installed id. Otherwise the
    /// downloaded full list is filtered down and written as the new user
    /// cache. Without a full list the result is empty and the caller is
    /// expected to [`spawn_download`](Self::spawn_download).
    pub async fn load(&self, installed: &[String]) -> BTreeMap<String, String> {
        if let Some(cached) = read_json::<BTreeMap<String, String>>(&self.user_cache_path()).await
            && installed.iter().all(|id| cached.contains_key(id))
        {
            return cached;
        }

        let Some(document) = read_json::<AppListDocument>(&self.full_list_path()).await else {
            tracing::debug!("No app list on disk yet");
            return BTreeMap::new();
        };

        let all = document.names();
        let names: BTreeMap<String, String> = installed
            .iter()
            .map(|id| {
                let name = all.get(id).cloned().unwrap_or_else(|| id.clone());
                (id.clone(), name)
            })
            .collect();

        if let Err(err) = write_json(&self.user_cache_path(), &names).await {
            tracing::warn!("Could not write app name cache: {}", err);
        }
        names
    }

    /// Downloads the full list and stores it. Returns the number of apps.
    pub async fn download_full_list(&self) -> Result<usize> {
        let text = self.fetcher.fetch_text(&self.url).await?;
        let document: AppListDocument =
            serde_json::from_str(&text).map_err(|e| CollectError::parse(self.url.as_str(), e))?;
        let count = document.applist.apps.len();

        write_json(&self.full_list_path(), &document)
            .await
            .map_err(|err| StatsError::persistence(FULL_LIST_FILE, err))?;

        tracing::info!("Downloaded names of {} apps", count);
        if let Some(events) = &self.events {
            events.publish(StatsEvent::AppNamesUpdated { count });
        }
        Ok(count)
    }

    /// Runs [`download_full_list`](Self::download_full_list) in the background.
    /// Failures are logged.
    pub fn spawn_download(self: Arc<Self>) -> JoinHandle<Option<usize>> {
        tokio::spawn(async move {
            match self.download_full_list().await {
                Ok(count) => Some(count),
                Err(err) => {
                    tracing::warn!("App list download failed: {}", err);
                    None
                }
            }
        })
    }
}

/// Name for `id`, or the id itself when unknown.
pub fn display_name(names: &BTreeMap<String, String>, id: &str) -> String {
    names
        .get(id)
        .filter(|name| !name.is_empty())
        .cloned()
        .unwrap_or_else(|| id.to_string())
}

async fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let text = tokio::fs::read_to_string(path).await.ok()?;
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!("Ignoring unreadable {}: {}", path.display(), err);
            None
        }
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> std::result::Result<(), RepositoryError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string(value).map_err(|e| RepositoryError::Json(e.to_string()))?;
    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, json).await?;
    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}
