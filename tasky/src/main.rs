//! tasky server binary

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use tasky::prelude::*;

/// Task-management REST API
#[derive(Debug, Parser)]
#[command(name = "tasky", version, about)]
struct Cli {
    /// Configuration file, replacing the ./config.toml and XDG lookup
    #[arg(short, long, env = "TASKY_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let dotenv = Config::load_dotenv();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::load().context("failed to load configuration")?,
    };
    if let Some(port) = cli.port {
        config.service.port = port;
    }

    init_tracing(&config).context("failed to initialize tracing")?;
    if let Some(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    tracing::info!("Connecting to the document store...");
    let store = SurrealStore::connect(&config.store)
        .await
        .context("failed to connect to the document store")?;

    let state = AppState::new(config.clone(), store);
    let app = router(state);

    Server::new(config).serve(app).await?;

    Ok(())
}
