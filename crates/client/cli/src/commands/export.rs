//! Flat table export of a platform's stats.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use client_bootstrap::EngineSetup;
use console::style;

use super::PlatformArgs;

/// Export every cached stat of a platform as a flat table
#[derive(Parser, Debug)]
pub struct Export {
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Field separator (default: STATS_EXPORT_SEPARATOR or `,`)
    #[arg(short, long)]
    pub separator: Option<String>,

    /// Output directory (default: STATS_EXPORT_DIR)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Print the table instead of writing a file
    #[arg(long)]
    pub stdout: bool,
}

impl Export {
    pub async fn execute(self, setup: &EngineSetup) -> Result<()> {
        let engine = &setup.engine;
        let platform = &self.platform.platform;
        let separator = self
            .separator
            .unwrap_or_else(|| setup.config.export_separator.clone());

        if self.stdout {
            print!("{}", engine.export_flat_table(platform, &separator).render());
            return Ok(());
        }

        let dir = self.dir.unwrap_or_else(|| setup.config.export_dir.clone());
        let path = engine.export_to_file(platform, &separator, &dir).await?;
        println!(
            "{} Exported {} to {}",
            style("✓").green().bold(),
            style(platform).cyan(),
            path.display()
        );
        Ok(())
    }
}
