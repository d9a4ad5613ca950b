//! Hide and unhide metrics per account.

use anyhow::Result;
use clap::Parser;
use client_bootstrap::EngineSetup;
use console::style;

use super::PlatformArgs;

/// Metric of one account's game stats
#[derive(Parser, Debug)]
pub struct Visibility {
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Game name
    #[arg(short, long)]
    pub game: String,

    /// Account identifier
    #[arg(short, long)]
    pub account: String,

    /// Metric key, as listed by `metrics`
    pub metric: String,
}

impl Visibility {
    pub fn execute(self, setup: &EngineSetup, hide: bool) -> Result<()> {
        let engine = &setup.engine;
        self.platform.activate(engine)?;

        let changed = if hide {
            engine.hide_metric(&self.game, &self.account, &self.metric)?
        } else {
            engine.unhide_metric(&self.game, &self.account, &self.metric)?
        };

        let action = if hide { "hidden" } else { "visible" };
        if changed {
            println!(
                "{} {} is now {} for {}",
                style("✓").green().bold(),
                style(&self.metric).cyan(),
                action,
                self.account
            );
        } else {
            println!("{}", style(format!("{} unchanged", self.metric)).dim());
        }
        Ok(())
    }
}
