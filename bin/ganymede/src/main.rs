use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{AppConfig, BotConfig, ConnectorKind, TracingSink};
use engine::Bot;
use strategy::{catalog, StrategyRegistry};

#[derive(Parser)]
#[command(name = "ganymede", about = "Live market-data strategy bot")]
struct Cli {
    /// Bot config (TOML, or the web UI's JSON shape if it ends in .json).
    /// Defaults to $GANYMEDE_CONFIG, then config/bot.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the available connectors and strategies and exit.
    #[arg(long, default_value_t = false)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if cli.list {
        print_catalog();
        return Ok(());
    }

    // ── Config ────────────────────────────────────────────────────────────────
    let app = AppConfig::from_env();
    let path = cli.config.unwrap_or_else(|| PathBuf::from(&app.config_path));
    let config = load_config(&path)?.with_env_credentials();
    info!(
        path = %path.display(),
        symbol = %config.symbol,
        connector = %config.connector,
        strategy = %config.strategy,
        paper = config.paper_trading,
        "Ganymede starting"
    );

    // ── Bot ───────────────────────────────────────────────────────────────────
    let mut bot = Bot::new(Arc::new(TracingSink), StrategyRegistry::default());
    bot.start(config).await.context("bot failed to start")?;

    info!("Bot running. Press Ctrl-C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutdown signal received.");

    bot.stop().await;
    Ok(())
}

fn load_config(path: &Path) -> Result<BotConfig> {
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let config = if is_json {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        BotConfig::from_json(&raw)?
    } else {
        BotConfig::load(path)?
    };
    Ok(config)
}

fn print_catalog() {
    println!("Connectors:");
    for kind in ConnectorKind::ALL {
        println!("  {:<12} {}", kind.key(), kind.description());
        if !kind.required_credentials().is_empty() {
            println!("  {:<12} credentials: {}", "", kind.required_credentials().join(", "));
        }
    }

    println!("\nStrategies:");
    for strategy in catalog() {
        println!("  {:<14} {}", strategy.key, strategy.name);
        println!("  {:<14} {}", "", strategy.description);
        for p in strategy.params {
            println!(
                "  {:<14}   {} ({}): default {}, range {}..={}",
                "", p.key, p.label, p.default, p.min, p.max
            );
        }
    }
}
