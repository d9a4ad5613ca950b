//! Outcome of one refresh operation.

use crate::api::{CollectError, StatsError};

/// What a refresh of one game did.
///
/// Failures are collected here instead of being raised, so one bad account
/// never stops the others. [`RefreshReport::notification`] condenses them
/// into the single message shown to the user.
#[derive(Debug)]
pub struct RefreshReport {
    pub game: String,
    /// Accounts whose stats were replaced, in completion order.
    pub refreshed: Vec<String>,
    /// Accounts that kept their previous stats.
    pub failed: Vec<(String, CollectError)>,
    /// Accounts left alone because another refresh was collecting them.
    pub skipped: Vec<String>,
    pub persist_error: Option<StatsError>,
}

impl RefreshReport {
    pub fn new(game: impl Into<String>) -> Self {
        Self {
            game: game.into(),
            refreshed: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            persist_error: None,
        }
    }

    pub fn attempted(&self) -> usize {
        self.refreshed.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.persist_error.is_none()
    }

    /// A single user-facing message, or `None` when nothing went wrong.
    pub fn notification(&self) -> Option<String> {
        let collect = self.failed.first().map(|(account, err)| {
            format!(
                "Could not refresh {} of {} accounts for {} ({}: {})",
                self.failed.len(),
                self.attempted(),
                self.game,
                account,
                err
            )
        });
        let persist = self
            .persist_error
            .as_ref()
            .map(|_| format!("Stats for {} could not be saved", self.game));

        match (collect, persist) {
            (Some(collect), Some(persist)) => Some(format!("{collect}. {persist}")),
            (collect, persist) => collect.or(persist),
        }
    }
}
