//! Command implementations for the CLI
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod accounts;
mod app_names;
mod export;
mod view;
mod visibility;

pub use accounts::{Disable, Enable, Refresh};
pub use app_names::AppNames;
pub use export::Export;
pub use view::{Games, Metrics, Platforms, Show};
pub use visibility::Visibility;

use anyhow::Result;
use clap::Args;
use console::style;
use stats_runtime::{AggregationEngine, RefreshReport};

/// Platform whose games a command works on.
#[derive(Args, Debug)]
pub struct PlatformArgs {
    /// Platform name, as listed by `platforms`
    #[arg(short, long)]
    pub platform: String,
}

impl PlatformArgs {
    /// Makes the platform active and returns its games.
    pub fn activate(&self, engine: &AggregationEngine) -> Result<Vec<String>> {
        if !engine.has_any_games(&self.platform) {
            anyhow::bail!("Platform '{}' has no games with stats", self.platform);
        }
        Ok(engine.set_active_platform(&self.platform))
    }
}

/// Prints the outcome of a refresh. Failures go to stderr.
pub(crate) fn print_report(report: &RefreshReport) {
    if !report.refreshed.is_empty() {
        println!(
            "{} {}: refreshed {}",
            style("✓").green().bold(),
            style(&report.game).cyan(),
            report.refreshed.join(", ")
        );
    }
    if let Some(notification) = report.notification() {
        eprintln!("{} {}", style("✗").red().bold(), notification);
    }
}
