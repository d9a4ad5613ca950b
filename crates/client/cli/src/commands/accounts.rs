//! Commands that change which accounts a game collects for.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Parser;
use client_bootstrap::EngineSetup;
use console::style;

use super::{PlatformArgs, print_report};

/// Enable a game for an account and collect its stats
#[derive(Parser, Debug)]
pub struct Enable {
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Game name
    #[arg(short, long)]
    pub game: String,

    /// Account identifier
    pub account: String,

    /// Account variable used by the game's source (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
}

impl Enable {
    pub async fn execute(self, setup: &EngineSetup) -> Result<()> {
        let engine = &setup.engine;
        self.platform.activate(engine)?;

        let vars: BTreeMap<String, String> = self.vars.into_iter().collect();
        let report = engine
            .enable_game_for_account(&self.game, &self.account, vars)
            .await
            .with_context(|| format!("Failed to enable '{}'", self.game))?;

        print_report(&report);
        Ok(())
    }
}

/// Forget an account's stats for a game
#[derive(Parser, Debug)]
pub struct Disable {
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Game name
    #[arg(short, long)]
    pub game: String,

    /// Account identifier
    pub account: String,
}

impl Disable {
    pub fn execute(self, setup: &EngineSetup) -> Result<()> {
        let engine = &setup.engine;
        self.platform.activate(engine)?;

        if engine.disable_game_for_account(&self.game, &self.account)? {
            println!(
                "{} Disabled {} for {}",
                style("✓").green().bold(),
                style(&self.game).cyan(),
                self.account
            );
        } else {
            println!(
                "{}",
                style(format!("{} was not enabled for {}", self.game, self.account)).dim()
            );
        }
        Ok(())
    }
}

/// Re-collect stats of every account
#[derive(Parser, Debug)]
pub struct Refresh {
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Refresh only this game
    #[arg(short, long)]
    pub game: Option<String>,
}

impl Refresh {
    pub async fn execute(self, setup: &EngineSetup) -> Result<()> {
        let engine = &setup.engine;
        let games = match self.game {
            Some(game) => {
                self.platform.activate(engine)?;
                vec![game]
            }
            None => self.platform.activate(engine)?,
        };

        let tasks: Vec<_> = games
            .iter()
            .map(|game| engine.spawn_refresh(game, &self.platform.platform))
            .collect();

        let mut failures = 0;
        for task in tasks {
            let game = task.game().to_string();
            match task.join().await {
                Ok(report) => {
                    if report.attempted() > 0 {
                        print_report(&report);
                    }
                    if !report.is_success() {
                        failures += 1;
                    }
                }
                Err(err) => {
                    eprintln!("{} {}: {}", style("✗").red().bold(), game, err);
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{} of {} games did not refresh cleanly", failures, games.len());
        }
        Ok(())
    }
}

fn parse_var(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{arg}'")),
    }
}
