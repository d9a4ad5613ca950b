//! App id to name resolution.

use anyhow::Result;
use clap::Parser;
use client_bootstrap::EngineSetup;
use console::style;
use stats_runtime::display_name;

/// Resolve app ids to display names
#[derive(Parser, Debug)]
pub struct AppNames {
    /// Download the full app list even if one is stored
    #[arg(long)]
    pub download: bool,

    /// Installed app ids
    pub ids: Vec<String>,
}

impl AppNames {
    pub async fn execute(self, setup: &EngineSetup) -> Result<()> {
        let resolver = &setup.app_names;

        if self.download || !resolver.has_full_list() {
            match resolver.download_full_list().await {
                Ok(count) => println!(
                    "{} Stored names of {} apps",
                    style("✓").green().bold(),
                    count
                ),
                // Ids still resolve to themselves without a list.
                Err(err) => eprintln!("{} {}", style("✗").red().bold(), err),
            }
        }

        let names = resolver.load(&self.ids).await;
        for id in &self.ids {
            println!("{:<10} {}", id, display_name(&names, id));
        }
        Ok(())
    }
}
