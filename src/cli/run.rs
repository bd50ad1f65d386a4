use crate::config::parse::load_config;
use crate::storage::memory::MemoryJobStore;
use crate::web::run_server;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::parse::ConfigError),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("shutdown signal error: {0}")]
    Signal(#[from] std::io::Error),
}

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match config_path {
        Some(path) => path,
        None => {
            eprintln!("Error: config not found");
            eprintln!("Searched locations:");
            eprintln!("  ~/.config/streamgate/config.yml");
            eprintln!("  /etc/streamgate/config.yml");
            eprintln!("\nUse --config <path> to specify a config file, or run 'streamgate config init' to generate one.");
            std::process::exit(1);
        }
    };

    run_gateway(&config_path).await.map_err(|e| e.into())
}

async fn run_gateway(config_path: &PathBuf) -> Result<(), RunError> {
    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(config_path)?;

    // The job record store is an external system in production; the bundled
    // in-memory store lets the gateway run standalone for demos and tests,
    // with extraction jobs completed by an external driver of the store.
    let store = Arc::new(MemoryJobStore::new());
    info!("Using in-memory job store");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = run_server(&config, store, shutdown_rx).await {
            error!("Web server error: {}", e);
        }
    });

    signal::ctrl_c().await?;
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);

    server_handle.await?;
    info!("Shutdown complete");

    Ok(())
}
