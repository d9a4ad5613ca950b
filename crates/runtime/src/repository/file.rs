//! File-based StatRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use stats_core::StatSnapshot;

use crate::repository::{RepositoryError, Result, StatRepository};

/// File-based implementation of StatRepository.
///
/// Each game is stored as pretty-printed JSON in `stats_{game_id}.json`.
/// Writes go to a temp file first and are renamed into place, so a crash
/// mid-write leaves the previous record intact.
pub struct FileStatRepository {
    base_dir: PathBuf,
}

impl FileStatRepository {
    /// Create a new file-based stat repository.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn stats_path(&self, game_id: &str) -> PathBuf {
        self.base_dir
            .join(format!("stats_{}.json", file_safe(game_id)))
    }
}

/// Restricts an id to characters that are safe in a file name.
pub(crate) fn file_safe(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl StatRepository for FileStatRepository {
    fn save(&self, game_id: &str, snapshot: &StatSnapshot) -> Result<()> {
        let path = self.stats_path(game_id);
        let temp_path = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| RepositoryError::Json(e.to_string()))?;
        fs::write(&temp_path, json)?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        tracing::debug!(
            "Saved {} accounts for '{}' to {}",
            snapshot.len(),
            game_id,
            path.display()
        );

        Ok(())
    }

    fn load(&self, game_id: &str) -> Result<Option<StatSnapshot>> {
        let path = self.stats_path(game_id);

        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)?;
        let snapshot: StatSnapshot = serde_json::from_str(&json).map_err(|e| {
            RepositoryError::CorruptedData(format!("{}: {}", path.display(), e))
        })?;

        tracing::debug!(
            "Loaded {} cached accounts for '{}'",
            snapshot.len(),
            game_id
        );

        Ok(Some(snapshot))
    }

    fn delete(&self, game_id: &str) -> Result<()> {
        let path = self.stats_path(game_id);

        if path.exists() {
            fs::remove_file(&path)?;
            tracing::info!("Deleted stat cache: {}", path.display());
        }

        Ok(())
    }
}
