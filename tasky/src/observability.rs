//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::{
    config::{Config, LogFormat},
    error::{Error, Result},
};

/// Build the log filter: `RUST_LOG` wins, else the configured level
pub fn env_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.service.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global tracing subscriber
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = env_filter(config);

    let installed = match config.service.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .try_init(),
    };
    installed.map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {}", e)))?;

    tracing::info!("Tracing initialized for service: {}", config.service.name);

    Ok(())
}
