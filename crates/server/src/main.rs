mod bootstrap;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use trivet_core::config::{AppConfig, ConfigOverrides, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "trivet-server",
    about = "Slack trivia bot over socket mode",
    after_help = "Examples:\n  trivet-server\n  trivet-server --config config/trivet.toml --log-level debug"
)]
struct Cli {
    #[arg(long, help = "Path to a trivet.toml config file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Log level override (trace|debug|info|warn|error)")]
    log_level: Option<String>,
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use trivet_core::config::LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions {
        config_path: cli.config,
        require_file: false,
        overrides: ConfigOverrides { log_level: cli.log_level, ..ConfigOverrides::default() },
    })?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    app.slack_runner.start().await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        "trivet-server started"
    );
    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "trivet-server stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
