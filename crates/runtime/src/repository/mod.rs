//! Repository layer for cached statistics.
//!
//! Repositories handle data that CHANGES during a session:
//! - Per-game snapshots of collected account stats
//! - Hidden-metric selections and account variables stored alongside them
//!
//! Static definitions (games, metrics, platforms) are handled by
//! `stats-content`, not by repositories.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileStatRepository;
pub(crate) use file::file_safe;
pub use memory::InMemoryStatRepository;
pub use traits::StatRepository;
