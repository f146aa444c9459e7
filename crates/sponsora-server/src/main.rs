//! Sponsora Server — application entry point.

mod actor;
mod config;
mod error;
mod routes;
mod state;

use std::process::ExitCode;

use sponsora_db::{DbManager, run_migrations};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("Starting Sponsora server...");

    match run().await {
        Ok(()) => {
            info!("Sponsora server stopped.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Sponsora server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load()?;

    let manager = DbManager::connect(&config.database).await?;
    run_migrations(manager.client()).await?;

    let state = AppState::new(manager.client().clone(), config.donations.clone());
    let app = routes::router(state);

    let listener = TcpListener::bind(config.http.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
