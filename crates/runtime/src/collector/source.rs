//! Collector that reads JSON payloads from a game's declared data source.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use stats_core::{CollectedStats, DataSource, GameDefinition, MetricDefinition};

use crate::api::CollectError;
use crate::collector::{CollectRequest, Fetcher, StatCollector, render_template, render_url};
use crate::repository::file_safe;

/// Collects stats from [`DataSource::Web`] and [`DataSource::SaveFile`] sources.
///
/// Each metric's `pointer` is a JSON pointer into the payload. Image metrics
/// resolve to an image URL which is downloaded under `image_dir`; the stored
/// value is the local path.
pub struct SourceCollector {
    fetcher: Arc<dyn Fetcher>,
    image_dir: PathBuf,
}

impl SourceCollector {
    pub fn new(fetcher: Arc<dyn Fetcher>, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            image_dir: image_dir.into(),
        }
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    async fn read_payload(
        &self,
        game: &GameDefinition,
        location: &str,
    ) -> Result<Value, CollectError> {
        let text = match &game.source {
            DataSource::Web { .. } => self.fetcher.fetch_text(location).await?,
            DataSource::SaveFile { .. } => tokio::fs::read_to_string(location)
                .await
                .map_err(|e| CollectError::unavailable(location, e))?,
        };
        serde_json::from_str(&text).map_err(|e| CollectError::parse(location, e))
    }

    async fn download_image(
        &self,
        game: &GameDefinition,
        account_id: &str,
        metric: &MetricDefinition,
        url: &str,
    ) -> Result<PathBuf, CollectError> {
        let bytes = self.fetcher.fetch_bytes(url).await?;

        let dir = self.image_dir.join(file_safe(&game.unique_id));
        let path = dir.join(format!(
            "{}_{}.{}",
            file_safe(account_id),
            file_safe(&metric.key),
            image_extension(url)
        ));

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CollectError::unavailable(dir.display().to_string(), e))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| CollectError::unavailable(path.display().to_string(), e))?;

        Ok(path)
    }
}

#[async_trait]
impl StatCollector for SourceCollector {
    async fn collect(
        &self,
        game: &GameDefinition,
        request: &CollectRequest,
    ) -> Result<CollectedStats, CollectError> {
        let location = match &game.source {
            DataSource::Web { url } => render_url(url, request)?,
            DataSource::SaveFile { path } => render_template(path, request)?,
        };
        tracing::debug!(
            "Collecting '{}' for {} from {} {}",
            game.name,
            request.account_id,
            game.source.label(),
            location
        );

        let payload = self.read_payload(game, &location).await?;
        let mut collected = CollectedStats::new();

        for metric in game.metrics() {
            let Some(raw) = payload.pointer(&metric.pointer).and_then(value_text) else {
                tracing::debug!("No value for '{}' at {}", metric.key, metric.pointer);
                continue;
            };

            if metric.special_type.is_image_download() {
                match self
                    .download_image(game, &request.account_id, metric, &raw)
                    .await
                {
                    Ok(path) => {
                        collected.insert(metric.key.clone(), path.display().to_string());
                    }
                    Err(err) => {
                        tracing::warn!(
                            "Skipping image metric '{}' of '{}': {}",
                            metric.key,
                            game.name,
                            err
                        );
                    }
                }
            } else {
                collected.insert(metric.key.clone(), metric.format_value(&raw));
            }
        }

        if collected.is_empty() {
            return Err(CollectError::parse(
                location,
                "payload contained none of the defined metrics",
            ));
        }
        Ok(collected)
    }
}

/// Text form of a JSON value. `null` has none.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn image_extension(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or("jpg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use stats_core::SpecialType;
    use tempfile::TempDir;

    #[derive(Default)]
    struct ScriptedFetcher {
        texts: HashMap<String, String>,
        bytes: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, CollectError> {
            self.texts
                .get(url)
                .cloned()
                .ok_or_else(|| CollectError::unavailable(url, "connection refused"))
        }

        async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, CollectError> {
            self.bytes
                .get(url)
                .cloned()
                .ok_or_else(|| CollectError::unavailable(url, "connection refused"))
        }
    }

    fn csgo() -> GameDefinition {
        GameDefinition::new(
            "CS:GO",
            "csgo",
            DataSource::Web {
                url: "https://stats.invalid/{AccountId}".into(),
            },
        )
        .with_indicator("CS")
        .with_metric(MetricDefinition::new("Kills", "/stats/kills"))
        .with_metric(MetricDefinition::new("TimePlayed", "/stats/time").with_display_as("%x% s"))
        .with_metric(MetricDefinition::new("Clan", "/clan"))
        .with_metric(
            MetricDefinition::new("Avatar", "/avatar")
                .with_special_type(SpecialType::ImageDownload),
        )
    }

    fn collector(fetcher: ScriptedFetcher, dir: &TempDir) -> SourceCollector {
        SourceCollector::new(Arc::new(fetcher), dir.path().join("images"))
    }

    #[tokio::test]
    async fn test_web_source_values_in_definition_order() {
        let dir = TempDir::new().unwrap();
        let mut fetcher = ScriptedFetcher::default();
        fetcher.texts.insert(
            "https://stats.invalid/A1".into(),
            r#"{"clan": null, "stats": {"time": 3600, "kills": 10}, "avatar": "https://img.invalid/a.png?size=64"}"#.into(),
        );
        fetcher
            .bytes
            .insert("https://img.invalid/a.png?size=64".into(), vec![1, 2, 3]);

        let collected = collector(fetcher, &dir)
            .collect(&csgo(), &CollectRequest::new("A1", "Steam"))
            .await
            .unwrap();

        let keys: Vec<&str> = collected.keys().collect();
        assert_eq!(keys, vec!["Kills", "TimePlayed", "Avatar"]);
        assert_eq!(collected.get("Kills"), Some("10"));
        assert_eq!(collected.get("TimePlayed"), Some("3600 s"));

        let avatar = PathBuf::from(collected.get("Avatar").unwrap());
        assert!(avatar.ends_with("images/csgo/A1_Avatar.png"));
        assert_eq!(std::fs::read(avatar).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failed_image_download_skips_only_that_metric() {
        let dir = TempDir::new().unwrap();
        let mut fetcher = ScriptedFetcher::default();
        fetcher.texts.insert(
            "https://stats.invalid/A1".into(),
            r#"{"stats": {"kills": 3}, "avatar": "https://img.invalid/gone.jpg"}"#.into(),
        );

        let collected = collector(fetcher, &dir)
            .collect(&csgo(), &CollectRequest::new("A1", "Steam"))
            .await
            .unwrap();

        assert_eq!(collected.get("Kills"), Some("3"));
        assert!(!collected.contains_key("Avatar"));
    }

    #[tokio::test]
    async fn test_unreachable_source() {
        let dir = TempDir::new().unwrap();
        let err = collector(ScriptedFetcher::default(), &dir)
            .collect(&csgo(), &CollectRequest::new("A1", "Steam"))
            .await
            .unwrap_err();
        assert!(err.is_source_unavailable());
    }

    #[tokio::test]
    async fn test_web_account_id_stays_in_its_segment() {
        let dir = TempDir::new().unwrap();
        let mut fetcher = ScriptedFetcher::default();
        fetcher.texts.insert(
            "https://stats.invalid/other%2Fprofile%3Fx%3D1%23top".into(),
            r#"{"stats": {"kills": 7}}"#.into(),
        );
        fetcher
            .texts
            .insert("https://stats.invalid/other/profile".into(), r#"{"stats": {"kills": 99}}"#.into());

        let collected = collector(fetcher, &dir)
            .collect(&csgo(), &CollectRequest::new("other/profile?x=1#top", "Steam"))
            .await
            .unwrap();
        assert_eq!(collected.get("Kills"), Some("7"));
    }

    #[tokio::test]
    async fn test_malformed_and_empty_payloads_are_parse_failures() {
        let dir = TempDir::new().unwrap();
        let mut fetcher = ScriptedFetcher::default();
        fetcher
            .texts
            .insert("https://stats.invalid/A1".into(), "<html>".into());
        fetcher
            .texts
            .insert("https://stats.invalid/A2".into(), r#"{"other": 1}"#.into());
        let collector = collector(fetcher, &dir);

        for account in ["A1", "A2"] {
            let err = collector
                .collect(&csgo(), &CollectRequest::new(account, "Steam"))
                .await
                .unwrap_err();
            assert!(matches!(err, CollectError::ParseFailure { .. }), "{account}");
        }
    }

    #[tokio::test]
    async fn test_save_file_source_uses_account_vars() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("tf2_A1.json"),
            r#"{"wins": 5, "class": "Spy"}"#,
        )
        .unwrap();

        let game = GameDefinition::new(
            "TF2",
            "tf2",
            DataSource::SaveFile {
                path: "{SaveDir}/tf2_{AccountId}.json".into(),
            },
        )
        .with_metric(MetricDefinition::new("Wins", "/wins"))
        .with_metric(MetricDefinition::new("Class", "/class"));

        let request = CollectRequest::new("A1", "Steam").with_vars(BTreeMap::from([(
            "SaveDir".to_string(),
            dir.path().display().to_string(),
        )]));

        let collected = collector(ScriptedFetcher::default(), &dir)
            .collect(&game, &request)
            .await
            .unwrap();
        assert_eq!(collected.get("Wins"), Some("5"));
        assert_eq!(collected.get("Class"), Some("Spy"));

        let err = collector(ScriptedFetcher::default(), &dir)
            .collect(&game, &CollectRequest::new("A1", "Steam"))
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::MissingVariable { .. }));
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("https://x.invalid/a/b.png?x=1"), "png");
        assert_eq!(image_extension("https://x.invalid/avatar"), "jpg");
        assert_eq!(image_extension("https://x.invalid/a.verylong"), "jpg");
    }
}
