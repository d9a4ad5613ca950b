//! Worker tasks that back the aggregation engine.
//!
//! Collections run as independent tokio tasks that only return values; the
//! engine merges those values into its caches.

mod refresh;

pub(crate) use refresh::CollectionBatch;
pub use refresh::RefreshTask;
