//! Read-only commands: platforms, games, account stats and metric lists.

use anyhow::Result;
use clap::Parser;
use client_bootstrap::EngineSetup;
use console::style;

use super::PlatformArgs;

/// List platforms and the games each supports
#[derive(Parser, Debug)]
pub struct Platforms {}

impl Platforms {
    pub fn execute(self, setup: &EngineSetup) -> Result<()> {
        let engine = &setup.engine;

        for platform in engine.platforms() {
            let games = engine.compatible_games(&platform);
            println!("{}", style(&platform).bold());
            if games.is_empty() {
                println!("  {}", style("(no games)").dim());
            }
            for game in games {
                println!("  {}", game);
            }
        }
        Ok(())
    }
}

/// List available and enabled games of a platform
#[derive(Parser, Debug)]
pub struct Games {
    #[command(flatten)]
    pub platform: PlatformArgs,
}

impl Games {
    pub fn execute(self, setup: &EngineSetup) -> Result<()> {
        let engine = &setup.engine;
        self.platform.activate(engine)?;
        let enabled = engine.enabled_games();

        for game in engine.available_games() {
            let id = engine.game_id_from_name(&game).unwrap_or_default();
            if enabled.contains(&game) {
                println!("{} {} {}", style("●").green(), game, style(id).dim());
            } else {
                println!("{} {} {}", style("○").dim(), game, style(id).dim());
            }
        }
        Ok(())
    }
}

/// Show the visible stats of one account
#[derive(Parser, Debug)]
pub struct Show {
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Account identifier
    pub account: String,

    /// Print the view as JSON
    #[arg(long)]
    pub json: bool,
}

impl Show {
    pub fn execute(self, setup: &EngineSetup) -> Result<()> {
        let engine = &setup.engine;
        self.platform.activate(engine)?;
        let view = engine.stats_markup_for_account(&self.account);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&view)?);
            return Ok(());
        }

        if view.is_empty() {
            println!("{}", style("No stats collected for this account").dim());
            return Ok(());
        }

        for game in &view.games {
            println!("{}", style(&game.game).bold());
            for (key, markup) in &game.stats {
                if markup.indicator.is_empty() {
                    println!("  {}: {}", key, markup.value);
                } else {
                    println!(
                        "  {}: {} {}",
                        key,
                        markup.value,
                        style(&markup.indicator).dim()
                    );
                }
            }
        }
        Ok(())
    }
}

/// List the metrics a game defines
#[derive(Parser, Debug)]
pub struct Metrics {
    /// Game name or unique id
    pub game: String,
}

impl Metrics {
    pub fn execute(self, setup: &EngineSetup) -> Result<()> {
        let engine = &setup.engine;
        let game = engine
            .game_name_from_id(&self.game)
            .unwrap_or_else(|| self.game.clone());

        for (key, toggle_text) in engine.all_metrics(&game)? {
            println!("{:<20} {}", key, style(toggle_text).dim());
        }
        Ok(())
    }
}
