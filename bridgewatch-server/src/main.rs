//! Bridgewatch - Headless Watchdog Daemon
//!
//! Keeps a cache of account balances fresh through a single bridge session,
//! evaluates bridge health on a fixed cadence, and requests a restart through
//! the recovery hook when the bridge stays unhealthy.
//!
//! REST API on /api/*, load balancer health on /health.

#![allow(clippy::print_stdout, reason = "CLI binary reports to the terminal")]

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod cli;
mod commands;
mod router;
mod server_utils;
mod state;
#[cfg(test)]
mod test_helpers;

use bridgewatch_core::modules::config as core_config;
use bridgewatch_core::Watchdog;
use cli::{Cli, Commands};
use commands::DaemonClient;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    let command = cli.command.unwrap_or(Commands::Serve);
    let client_url = || -> Result<String> {
        if let Some(url) = &cli.url {
            return Ok(url.clone());
        }
        let port = match cli.port {
            Some(port) => port,
            None => core_config::load_config().map_err(|e| anyhow::anyhow!(e))?.server.port,
        };
        Ok(format!("http://127.0.0.1:{}", port))
    };

    match command {
        Commands::Serve => run_server(cli.port).await,
        Commands::Status { json } => {
            commands::handle_status(&DaemonClient::new(&client_url()?)?, json).await
        },
        Commands::Accounts { json } => {
            commands::handle_accounts(&DaemonClient::new(&client_url()?)?, json).await
        },
        Commands::Alerts { limit } => {
            commands::handle_alerts(&DaemonClient::new(&client_url()?)?, limit).await
        },
        Commands::Sync => commands::handle_sync(&DaemonClient::new(&client_url()?)?).await,
        Commands::Heal => commands::handle_heal(&DaemonClient::new(&client_url()?)?).await,
        Commands::Reset => commands::handle_reset(&DaemonClient::new(&client_url()?)?).await,
        Commands::Config(cmd) => commands::handle_config_command(cmd).await,
    }
}

async fn run_server(port_override: Option<u16>) -> Result<()> {
    let data_dir = core_config::get_data_dir()
        .map_err(|e| anyhow::anyhow!("Failed to get data directory: {}", e))?;
    let config = core_config::load_config().map_err(|e| anyhow::anyhow!(e))?;
    let port = port_override.unwrap_or(config.server.port);
    let server_config = config.server.clone();

    info!("🚀 Bridgewatch v{} starting on port {}...", env!("CARGO_PKG_VERSION"), port);
    info!("📁 Data directory: {}", data_dir.display());
    info!("🔗 Bridge: {}", config.bridge.base_url);

    let watchdog = Watchdog::from_config(config, &data_dir).map_err(|e| anyhow::anyhow!(e))?;
    watchdog.start();

    let state = AppState::new(watchdog.clone(), data_dir);
    let app = router::build_router(state);

    let listener = server_utils::create_listener(port, &server_config).await?;
    info!("🔌 API available at http://{}:{}/api/", server_config.bind_address, port);

    axum::serve(listener, app).with_graceful_shutdown(server_utils::shutdown_signal()).await?;

    info!("⏳ Stopping watchdog loops...");
    watchdog.shutdown().await;
    info!("👋 Bridgewatch stopped");

    Ok(())
}
