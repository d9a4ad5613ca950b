//! Command line front-end for the game statistics engine.
//!
//! Run with: `switcher-stats <command>`

mod commands;

use anyhow::Result;
use clap::Parser;
use client_bootstrap::{EngineBuilder, StatsConfig, dirs};
use commands::{
    AppNames, Disable, Enable, Export, Games, Metrics, Platforms, Refresh, Show, Visibility,
};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Per-account game statistics for the account switcher
#[derive(Parser)]
#[command(name = "switcher-stats")]
#[command(about = "Collect, cache and export per-account game statistics", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// List platforms and the games each supports
    Platforms(Platforms),

    /// List available and enabled games of a platform
    Games(Games),

    /// Show the visible stats of one account
    Show(Show),

    /// List the metrics a game defines
    Metrics(Metrics),

    /// Enable a game for an account and collect its stats
    Enable(Enable),

    /// Forget an account's stats for a game
    Disable(Disable),

    /// Re-collect stats of every account
    Refresh(Refresh),

    /// Hide a metric for an account
    Hide(Visibility),

    /// Show a previously hidden metric again
    Unhide(Visibility),

    /// Export every cached stat of a platform as a flat table
    Export(Export),

    /// Resolve app ids to display names
    AppNames(AppNames),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = StatsConfig::from_env();

    setup_logging()?;

    let setup = EngineBuilder::new(config).build()?;

    match cli.command {
        Command::Platforms(cmd) => cmd.execute(&setup),
        Command::Games(cmd) => cmd.execute(&setup),
        Command::Show(cmd) => cmd.execute(&setup),
        Command::Metrics(cmd) => cmd.execute(&setup),
        Command::Enable(cmd) => cmd.execute(&setup).await,
        Command::Disable(cmd) => cmd.execute(&setup),
        Command::Refresh(cmd) => cmd.execute(&setup).await,
        Command::Hide(cmd) => cmd.execute(&setup, true),
        Command::Unhide(cmd) => cmd.execute(&setup, false),
        Command::Export(cmd) => cmd.execute(&setup).await,
        Command::AppNames(cmd) => cmd.execute(&setup).await,
    }
}

/// Setup logging to both stderr and file
fn setup_logging() -> Result<()> {
    let log_dir = dirs::log_dir();
    std::fs::create_dir_all(&log_dir)?;

    // Setup file appender
    let file_appender = tracing_appender::rolling::never(&log_dir, "switcher-stats.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    // Create env filter
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    // Only warnings reach the terminal, command output stays readable
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    // Leak the guard to keep file writer alive
    std::mem::forget(guard);

    tracing::info!("Log file: {}/switcher-stats.log", log_dir.display());

    Ok(())
}
