//! Topic-based event bus for statistics events.
//!
//! Events are published to specific topics, and consumers (a UI, the CLI,
//! tests) subscribe only to the topics they need.

mod bus;
mod types;

pub use bus::{EventBus, Topic};
pub use types::StatsEvent;
