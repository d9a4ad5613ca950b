//! Topic-based event bus implementation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::StatsEvent;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Active platform changes
    Session,
    /// Refresh completion
    Refresh,
    /// Persistence failures and written exports
    Storage,
    /// App-name list updates
    AppNames,
}

struct Channels {
    session: broadcast::Sender<StatsEvent>,
    refresh: broadcast::Sender<StatsEvent>,
    storage: broadcast::Sender<StatsEvent>,
    app_names: broadcast::Sender<StatsEvent>,
}

impl Channels {
    fn sender(&self, topic: Topic) -> &broadcast::Sender<StatsEvent> {
        match topic {
            Topic::Session => &self.session,
            Topic::Refresh => &self.refresh,
            Topic::Storage => &self.storage,
            Topic::AppNames => &self.app_names,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Publishing never blocks and never fails.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                session: broadcast::channel(capacity).0,
                refresh: broadcast::channel(capacity).0,
                storage: broadcast::channel(capacity).0,
                app_names: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: StatsEvent) {
        let topic = event.topic();
        if self.channels.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<StatsEvent> {
        self.channels.sender(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
