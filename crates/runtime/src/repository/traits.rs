//! Repository contract for saving and loading per-game stat snapshots.

use stats_core::StatSnapshot;

use crate::repository::Result;

/// Durable storage for cached statistics, one record per game.
///
/// Records are keyed by the game's unique id. A missing record is not an
/// error: `load` returns `None` and the cache starts empty.
pub trait StatRepository: Send + Sync {
    /// Save the whole snapshot of one game, replacing any previous record.
    fn save(&self, game_id: &str, snapshot: &StatSnapshot) -> Result<()>;

    /// Load the snapshot of one game.
    fn load(&self, game_id: &str) -> Result<Option<StatSnapshot>>;

    /// Delete the record of one game. Deleting a missing record succeeds.
    fn delete(&self, game_id: &str) -> Result<()>;
}
